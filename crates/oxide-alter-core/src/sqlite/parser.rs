//! `CREATE TABLE` parser.

use tracing::debug;

use crate::error::ParseError;
use crate::lexer::{Keyword, Lexer, Span, Token, TokenKind};
use crate::structure::{
    ColumnDefinition, ConstraintKind, GeneratedColumn, GeneratedStorage, TableConstraint,
    TableStructure,
};

/// Parses a SQLite `CREATE TABLE` statement into its structure.
///
/// Single-column table-level primary keys are folded into the column's
/// flags. Composite keys stay a table constraint and also flag each listed
/// column.
///
/// # Errors
///
/// Returns a [`ParseError`] if the text is not a `CREATE TABLE` statement
/// with a table name and a column definition section.
pub fn parse_create_table(ddl: &str) -> Result<TableStructure, ParseError> {
    let source = normalize(ddl);
    let tokens = Lexer::new(&source).tokenize();
    let lex_error = tokens.iter().find_map(|t| match &t.kind {
        TokenKind::Error(message) => Some(ParseError::new(message.clone(), t.span)),
        _ => None,
    });
    if let Some(err) = lex_error {
        return Err(err);
    }

    let structure = Parser::new(&source, &tokens).parse_statement()?;
    debug!(
        table = %structure.table_name,
        columns = structure.columns.len(),
        constraints = structure.constraints.len(),
        "Parsed CREATE TABLE"
    );
    Ok(structure)
}

/// Strips comments and collapses whitespace outside quoted text.
pub(crate) fn normalize(ddl: &str) -> String {
    let mut out = String::with_capacity(ddl.len());
    let mut chars = ddl.chars().peekable();
    let mut pending_space = false;

    while let Some(c) = chars.next() {
        let close = match c {
            '\'' | '"' | '`' => Some(c),
            '[' => Some(']'),
            _ => None,
        };
        if let Some(close) = close {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c);
            for inner in chars.by_ref() {
                out.push(inner);
                if inner == close {
                    break;
                }
            }
            continue;
        }

        if c == '-' && chars.peek() == Some(&'-') {
            for inner in chars.by_ref() {
                if inner == '\n' {
                    break;
                }
            }
            pending_space = true;
            continue;
        }
        if c == '/' && chars.peek() == Some(&'*') {
            chars.next();
            let mut previous = '\0';
            for inner in chars.by_ref() {
                if previous == '*' && inner == '/' {
                    break;
                }
                previous = inner;
            }
            pending_space = true;
            continue;
        }
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }

        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        out.push(c);
    }
    out
}

/// Recursive descent over the token stream of one statement.
struct Parser<'a> {
    source: &'a str,
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    const fn new(source: &'a str, tokens: &'a [Token]) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
        }
    }

    /// Returns the current token. The stream always ends with `Eof`.
    fn peek(&self) -> &'a Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.pos.min(last)]
    }

    fn peek_at(&self, offset: usize) -> &'a Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[(self.pos + offset).min(last)]
    }

    fn advance(&mut self) -> &'a Token {
        let token = self.peek();
        if !token.is_eof() {
            self.pos += 1;
        }
        token
    }

    fn check_keyword(&self, keyword: Keyword) -> bool {
        self.peek().is_keyword(keyword)
    }

    fn eat_keyword(&mut self, keyword: Keyword) -> bool {
        if self.check_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if &self.peek().kind == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn describe(&self, token: &Token) -> String {
        if token.is_eof() {
            String::from("end of input")
        } else {
            String::from(token.span.slice(self.source))
        }
    }

    fn error_expected(&self, expected: &str) -> ParseError {
        let token = self.peek();
        if token.is_eof() {
            ParseError::unexpected_eof(expected, token.span)
        } else {
            ParseError::unexpected(expected, &self.describe(token), token.span)
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword, expected: &str) -> Result<(), ParseError> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(self.error_expected(expected))
        }
    }

    fn expect(&mut self, kind: &TokenKind, expected: &str) -> Result<(), ParseError> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.error_expected(expected))
        }
    }

    /// Returns the name a token spells, if it can name something.
    fn name_of(&self, token: &Token) -> Option<String> {
        match &token.kind {
            TokenKind::Identifier(s) | TokenKind::QuotedIdentifier(s) | TokenKind::String(s) => {
                Some(s.clone())
            }
            TokenKind::Keyword(_) => Some(String::from(token.span.slice(self.source))),
            _ => None,
        }
    }

    fn parse_name(&mut self, expected: &str) -> Result<String, ParseError> {
        let token = self.peek();
        match self.name_of(token) {
            Some(name) => {
                self.advance();
                Ok(name)
            }
            None => Err(self.error_expected(expected)),
        }
    }

    fn parse_statement(&mut self) -> Result<TableStructure, ParseError> {
        if !self.eat_keyword(Keyword::Create) {
            return Err(ParseError::new(
                "Not a CREATE TABLE statement",
                self.peek().span,
            ));
        }
        if !self.eat_keyword(Keyword::Temp) {
            self.eat_keyword(Keyword::Temporary);
        }
        if !self.eat_keyword(Keyword::Table) {
            return Err(ParseError::new(
                "Not a CREATE TABLE statement",
                self.peek().span,
            ));
        }
        if self.eat_keyword(Keyword::If) {
            self.expect_keyword(Keyword::Not, "NOT")?;
            self.expect_keyword(Keyword::Exists, "EXISTS")?;
        }

        let mut table_name = self.parse_name("table name")?;
        if self.eat(&TokenKind::Dot) {
            table_name = self.parse_name("table name")?;
        }

        if self.check_keyword(Keyword::As) {
            return Err(ParseError::new(
                "CREATE TABLE ... AS SELECT has no column definitions",
                self.peek().span,
            ));
        }
        if self.peek().kind != TokenKind::LeftParen {
            return Err(ParseError::new(
                "Missing column definition section",
                self.peek().span,
            ));
        }

        let clauses = self.split_body()?;
        let mut structure = TableStructure::new(table_name);
        for (start, end) in clauses {
            let mut clause_tokens = self.tokens[start..end].to_vec();
            clause_tokens.push(Token::new(TokenKind::Eof, self.tokens[end].span));
            let mut clause = Parser::new(self.source, &clause_tokens);
            let first = clause.peek();
            if first.as_keyword().is_some_and(Keyword::starts_table_constraint) {
                structure.constraints.push(clause.parse_table_constraint()?);
            } else {
                structure.columns.push(clause.parse_column()?);
            }
            if !clause.peek().is_eof() {
                return Err(clause.error_expected("',' or ')'"));
            }
        }

        self.parse_table_options(&mut structure)?;
        self.eat(&TokenKind::Semicolon);
        if !self.peek().is_eof() {
            return Err(self.error_expected("end of statement"));
        }

        if structure.columns.is_empty() {
            return Err(ParseError::new("No column definitions", Span::default()));
        }
        fold_primary_keys(&mut structure);
        Ok(structure)
    }

    /// Splits the parenthesized body on top-level commas.
    ///
    /// Returns token index ranges, one per clause, and leaves the cursor
    /// after the closing parenthesis.
    fn split_body(&mut self) -> Result<Vec<(usize, usize)>, ParseError> {
        let open = self.advance().span;
        let mut clauses = Vec::new();
        let mut depth = 0usize;
        let mut start = self.pos;

        loop {
            let token = self.peek();
            match token.kind {
                TokenKind::Eof => {
                    return Err(ParseError::new(
                        "Unbalanced parentheses in column definitions",
                        open.merge(token.span),
                    ));
                }
                TokenKind::LeftParen => depth += 1,
                TokenKind::RightParen if depth == 0 => {
                    if self.pos > start {
                        clauses.push((start, self.pos));
                    } else if !clauses.is_empty() {
                        return Err(self.error_expected("column definition"));
                    }
                    self.advance();
                    return Ok(clauses);
                }
                TokenKind::RightParen => depth -= 1,
                TokenKind::Comma if depth == 0 => {
                    if self.pos == start {
                        return Err(self.error_expected("column definition"));
                    }
                    clauses.push((start, self.pos));
                    start = self.pos + 1;
                }
                _ => {}
            }
            self.advance();
        }
    }

    /// Returns the trimmed source text inside the parentheses at the cursor
    /// and moves past the closing one.
    fn parenthesized(&mut self, expected: &str) -> Result<String, ParseError> {
        let open = self.peek();
        if open.kind != TokenKind::LeftParen {
            return Err(self.error_expected(expected));
        }
        self.advance();
        let mut depth = 0usize;
        loop {
            let token = self.peek();
            match token.kind {
                TokenKind::Eof => return Err(ParseError::unexpected_eof("')'", token.span)),
                TokenKind::LeftParen => depth += 1,
                TokenKind::RightParen if depth == 0 => {
                    self.advance();
                    let inner = Span::new(open.span.end, token.span.start);
                    return Ok(String::from(inner.slice(self.source).trim()));
                }
                TokenKind::RightParen => depth -= 1,
                _ => {}
            }
            self.advance();
        }
    }

    /// Parses `(name [COLLATE x] [ASC|DESC], ...)`, keeping only names.
    fn parse_column_list(&mut self) -> Result<Vec<String>, ParseError> {
        self.expect(&TokenKind::LeftParen, "'('")?;
        let mut columns = Vec::new();
        loop {
            columns.push(self.parse_name("column name")?);
            let mut depth = 0usize;
            loop {
                match self.peek().kind {
                    TokenKind::Comma if depth == 0 => break,
                    TokenKind::RightParen if depth == 0 => break,
                    TokenKind::LeftParen => depth += 1,
                    TokenKind::RightParen => depth -= 1,
                    TokenKind::Eof => return Err(self.error_expected("')'")),
                    _ => {}
                }
                self.advance();
            }
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RightParen, "')'")?;
        Ok(columns)
    }

    fn skip_conflict_clause(&mut self) -> Result<(), ParseError> {
        if self.check_keyword(Keyword::On) && self.peek_at(1).is_keyword(Keyword::Conflict) {
            self.advance();
            self.advance();
            self.parse_name("conflict resolution")?;
        }
        Ok(())
    }

    fn parse_table_options(&mut self, structure: &mut TableStructure) -> Result<(), ParseError> {
        loop {
            if self.eat_keyword(Keyword::Without) {
                self.expect_keyword(Keyword::Rowid, "ROWID")?;
                structure.options.without_row_id = true;
            } else if self.eat_keyword(Keyword::Strict) {
                structure.options.strict = true;
            } else {
                return Ok(());
            }
            self.eat(&TokenKind::Comma);
        }
    }

    fn parse_column(&mut self) -> Result<ColumnDefinition, ParseError> {
        let name = self.parse_name("column name")?;
        let mut column = ColumnDefinition::new(name, "");

        let mut type_words = Vec::new();
        loop {
            let token = self.peek();
            let is_type_word = match &token.kind {
                TokenKind::Identifier(_) => true,
                TokenKind::Keyword(kw) => !kw.starts_column_constraint(),
                _ => false,
            };
            if !is_type_word {
                break;
            }
            type_words.push(token.span.slice(self.source));
            self.advance();
        }
        column.data_type = type_words.join(" ");
        if !column.data_type.is_empty() && self.peek().kind == TokenKind::LeftParen {
            let size = self.parenthesized("type size")?;
            column.size = Some(size.split(',').map(str::trim).collect::<Vec<_>>().join(","));
        }

        while !self.peek().is_eof() {
            self.parse_column_constraint(&mut column)?;
        }
        Ok(column)
    }

    fn parse_column_constraint(&mut self, column: &mut ColumnDefinition) -> Result<(), ParseError> {
        let token = self.peek();
        let Some(keyword) = token.as_keyword() else {
            return Err(self.error_expected("column constraint"));
        };
        self.advance();

        match keyword {
            Keyword::Constraint => {
                self.parse_name("constraint name")?;
            }
            Keyword::Primary => {
                self.expect_keyword(Keyword::Key, "KEY")?;
                column.is_primary_key = true;
                if !self.eat_keyword(Keyword::Asc) {
                    self.eat_keyword(Keyword::Desc);
                }
                self.skip_conflict_clause()?;
                column.auto_increment = self.eat_keyword(Keyword::Autoincrement);
            }
            Keyword::Not => {
                self.expect_keyword(Keyword::Null, "NULL")?;
                column.is_nullable = false;
                self.skip_conflict_clause()?;
            }
            Keyword::Null => {
                column.is_nullable = true;
                self.skip_conflict_clause()?;
            }
            Keyword::Unique => {
                column.is_unique_key = true;
                self.skip_conflict_clause()?;
            }
            Keyword::Check => {
                column.check_constraint = Some(self.parenthesized("'(' after CHECK")?);
            }
            Keyword::Default => {
                column.default_value = Some(self.parse_default()?);
            }
            Keyword::Collate => {
                column.collation = Some(self.parse_name("collation name")?);
            }
            Keyword::References => {
                column.references = Some(self.parse_references()?);
            }
            Keyword::Generated => {
                self.expect_keyword(Keyword::Always, "ALWAYS")?;
                self.expect_keyword(Keyword::As, "AS")?;
                column.generated = Some(self.parse_generated()?);
            }
            Keyword::As => {
                column.generated = Some(self.parse_generated()?);
            }
            _ => {
                return Err(ParseError::unexpected(
                    "column constraint",
                    &self.describe(token),
                    token.span,
                ));
            }
        }
        Ok(())
    }

    fn parse_default(&mut self) -> Result<String, ParseError> {
        let token = self.peek();
        match &token.kind {
            TokenKind::LeftParen => {
                let inner = self.parenthesized("default expression")?;
                Ok(format!("({inner})"))
            }
            TokenKind::Plus | TokenKind::Minus => {
                self.advance();
                let number = self.peek();
                if !matches!(number.kind, TokenKind::Number(_)) {
                    return Err(self.error_expected("number"));
                }
                self.advance();
                Ok(String::from(token.span.merge(number.span).slice(self.source)))
            }
            TokenKind::String(_)
            | TokenKind::Number(_)
            | TokenKind::Blob(_)
            | TokenKind::Identifier(_)
            | TokenKind::Keyword(Keyword::Null) => {
                self.advance();
                Ok(String::from(token.span.slice(self.source)))
            }
            _ => Err(self.error_expected("default value")),
        }
    }

    /// Captures the text of a `REFERENCES` clause up to the next column
    /// constraint.
    fn parse_references(&mut self) -> Result<String, ParseError> {
        let mut captured: Option<Span> = None;
        let mut depth = 0usize;
        loop {
            let token = self.peek();
            let ends_clause = match &token.kind {
                TokenKind::Eof => true,
                TokenKind::Keyword(Keyword::Not) => {
                    depth == 0
                        && !matches!(&self.peek_at(1).kind,
                            TokenKind::Identifier(word) if word.eq_ignore_ascii_case("DEFERRABLE"))
                }
                TokenKind::Keyword(kw) => depth == 0 && kw.starts_column_constraint(),
                _ => false,
            };
            if ends_clause {
                break;
            }
            match token.kind {
                TokenKind::LeftParen => depth += 1,
                TokenKind::RightParen => depth = depth.saturating_sub(1),
                _ => {}
            }
            captured = Some(captured.map_or(token.span, |span| span.merge(token.span)));
            self.advance();
        }
        captured
            .map(|span| String::from(span.slice(self.source)))
            .ok_or_else(|| self.error_expected("referenced table"))
    }

    fn parse_generated(&mut self) -> Result<GeneratedColumn, ParseError> {
        let expression = self.parenthesized("'(' after AS")?;
        let storage = if self.eat_keyword(Keyword::Stored) {
            Some(GeneratedStorage::Stored)
        } else if self.eat_keyword(Keyword::Virtual) {
            Some(GeneratedStorage::Virtual)
        } else {
            None
        };
        Ok(GeneratedColumn {
            expression,
            storage,
        })
    }

    fn parse_table_constraint(&mut self) -> Result<TableConstraint, ParseError> {
        let name = if self.eat_keyword(Keyword::Constraint) {
            Some(self.parse_name("constraint name")?)
        } else {
            None
        };

        let token = self.peek();
        let mut constraint = match token.as_keyword() {
            Some(Keyword::Primary) => {
                self.advance();
                self.expect_keyword(Keyword::Key, "KEY")?;
                let columns = self.parse_column_list()?;
                self.skip_conflict_clause()?;
                TableConstraint::new(ConstraintKind::PrimaryKey, columns)
            }
            Some(Keyword::Unique) => {
                self.advance();
                let columns = self.parse_column_list()?;
                self.skip_conflict_clause()?;
                TableConstraint::new(ConstraintKind::Unique, columns)
            }
            Some(Keyword::Check) => {
                self.advance();
                let mut check = TableConstraint::new(ConstraintKind::Check, Vec::new());
                check.condition = Some(self.parenthesized("'(' after CHECK")?);
                check
            }
            Some(Keyword::Foreign) => {
                self.advance();
                self.expect_keyword(Keyword::Key, "KEY")?;
                let columns = self.parse_column_list()?;
                let mut fk = TableConstraint::new(ConstraintKind::ForeignKey, columns);
                self.parse_foreign_key_target(&mut fk)?;
                fk
            }
            _ => return Err(self.error_expected("PRIMARY KEY, UNIQUE, CHECK or FOREIGN KEY")),
        };
        constraint.name = name;
        Ok(constraint)
    }

    fn parse_foreign_key_target(&mut self, fk: &mut TableConstraint) -> Result<(), ParseError> {
        self.expect_keyword(Keyword::References, "REFERENCES")?;
        fk.reference_table = Some(self.parse_name("referenced table")?);
        if self.peek().kind == TokenKind::LeftParen {
            fk.reference_columns = self.parse_column_list()?;
        }

        while !self.peek().is_eof() {
            if self.eat_keyword(Keyword::On) {
                let event = self.parse_name("DELETE or UPDATE")?.to_ascii_uppercase();
                let action = self.parse_referential_action()?;
                match event.as_str() {
                    "DELETE" => fk.on_delete = Some(action),
                    "UPDATE" => fk.on_update = Some(action),
                    _ => {
                        return Err(ParseError::unexpected(
                            "DELETE or UPDATE",
                            &event,
                            self.peek().span,
                        ))
                    }
                }
            } else {
                // MATCH and DEFERRABLE clauses carry no structure we keep.
                self.advance();
            }
        }
        Ok(())
    }

    fn parse_referential_action(&mut self) -> Result<String, ParseError> {
        let first = self.parse_name("referential action")?.to_ascii_uppercase();
        let action = match first.as_str() {
            "SET" => {
                let second = self.parse_name("NULL or DEFAULT")?.to_ascii_uppercase();
                format!("SET {second}")
            }
            "NO" => {
                let second = self.parse_name("ACTION")?.to_ascii_uppercase();
                format!("NO {second}")
            }
            _ => first,
        };
        Ok(action)
    }
}

/// Moves single-column primary key constraints onto the column and flags
/// every column of a composite key.
fn fold_primary_keys(structure: &mut TableStructure) {
    let mut folded = Vec::new();
    for (index, constraint) in structure.constraints.iter().enumerate() {
        if constraint.kind != ConstraintKind::PrimaryKey {
            continue;
        }
        for name in &constraint.columns {
            if let Some(column) = structure.columns.iter_mut().find(|c| &c.name == name) {
                column.is_primary_key = true;
            }
        }
        if constraint.columns.len() == 1 {
            folded.push(index);
        }
    }
    for index in folded.into_iter().rev() {
        structure.constraints.remove(index);
    }
}

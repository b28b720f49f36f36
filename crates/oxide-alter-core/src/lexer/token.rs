//! Token types for the DDL lexer.

use super::Span;

/// Keywords the `CREATE TABLE` grammar cares about.
///
/// SQLite accepts most of these as bare column names, so the parser treats
/// them as identifiers wherever a name is expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    // Statement
    Create,
    Temp,
    Temporary,
    Table,
    If,
    Not,
    Exists,
    As,
    Select,
    Without,
    Rowid,
    Strict,

    // Constraints
    Constraint,
    Primary,
    Key,
    Unique,
    Check,
    Foreign,
    References,
    Default,
    Collate,
    Null,
    Autoincrement,
    Asc,
    Desc,
    On,
    Conflict,

    // Generated columns
    Generated,
    Always,
    Stored,
    Virtual,
}

const KEYWORDS: &[(&str, Keyword)] = &[
    ("CREATE", Keyword::Create),
    ("TEMP", Keyword::Temp),
    ("TEMPORARY", Keyword::Temporary),
    ("TABLE", Keyword::Table),
    ("IF", Keyword::If),
    ("NOT", Keyword::Not),
    ("EXISTS", Keyword::Exists),
    ("AS", Keyword::As),
    ("SELECT", Keyword::Select),
    ("WITHOUT", Keyword::Without),
    ("ROWID", Keyword::Rowid),
    ("STRICT", Keyword::Strict),
    ("CONSTRAINT", Keyword::Constraint),
    ("PRIMARY", Keyword::Primary),
    ("KEY", Keyword::Key),
    ("UNIQUE", Keyword::Unique),
    ("CHECK", Keyword::Check),
    ("FOREIGN", Keyword::Foreign),
    ("REFERENCES", Keyword::References),
    ("DEFAULT", Keyword::Default),
    ("COLLATE", Keyword::Collate),
    ("NULL", Keyword::Null),
    ("AUTOINCREMENT", Keyword::Autoincrement),
    ("ASC", Keyword::Asc),
    ("DESC", Keyword::Desc),
    ("ON", Keyword::On),
    ("CONFLICT", Keyword::Conflict),
    ("GENERATED", Keyword::Generated),
    ("ALWAYS", Keyword::Always),
    ("STORED", Keyword::Stored),
    ("VIRTUAL", Keyword::Virtual),
];

impl Keyword {
    /// Looks a word up, ignoring ASCII case.
    #[must_use]
    pub fn lookup(word: &str) -> Option<Self> {
        KEYWORDS
            .iter()
            .find(|(text, _)| text.eq_ignore_ascii_case(word))
            .map(|&(_, keyword)| keyword)
    }

    /// Returns true if the keyword starts a column constraint, which ends
    /// a column's type name.
    #[must_use]
    pub const fn starts_column_constraint(self) -> bool {
        matches!(
            self,
            Self::Constraint
                | Self::Primary
                | Self::Not
                | Self::Null
                | Self::Unique
                | Self::Check
                | Self::Default
                | Self::Collate
                | Self::References
                | Self::Generated
                | Self::As
        )
    }

    /// Returns true if the keyword starts a table-level constraint.
    #[must_use]
    pub const fn starts_table_constraint(self) -> bool {
        matches!(
            self,
            Self::Constraint | Self::Primary | Self::Unique | Self::Check | Self::Foreign
        )
    }
}

/// The kind of a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// A keyword.
    Keyword(Keyword),
    /// A bare identifier.
    Identifier(String),
    /// A quoted identifier (`"x"`, `` `x` `` or `[x]`), unescaped.
    QuotedIdentifier(String),
    /// A string literal, unescaped.
    String(String),
    /// A numeric literal as written.
    Number(String),
    /// A blob literal (`X'..'`).
    Blob(Vec<u8>),

    // Delimiters
    LeftParen,
    RightParen,
    Comma,
    Semicolon,
    Dot,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Concat,
    BitAnd,
    BitOr,
    BitNot,
    LeftShift,
    RightShift,
    Question,
    Colon,
    At,
    Dollar,

    /// End of input.
    Eof,
    /// A lexing error.
    Error(String),
}

/// A token with its location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// The location in the source text.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns true if this is an EOF token.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    /// Returns the keyword if this is a keyword token.
    #[must_use]
    pub const fn as_keyword(&self) -> Option<Keyword> {
        match &self.kind {
            TokenKind::Keyword(kw) => Some(*kw),
            _ => None,
        }
    }

    /// Returns true if this token is the given keyword.
    #[must_use]
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.as_keyword() == Some(keyword)
    }
}

use std::fmt;

/// Line/column pair, both 1-based. Line 0 marks a synthetic position with no
/// corresponding source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    pub fn synthetic() -> Self {
        Self { line: 0, column: 0 }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Program markers
    Miaou,
    Meow,

    // Keywords
    Si,
    Alors,
    Sinon,
    SinonSi,
    TantQue,
    Repeter,
    Fois,
    PourChaque,
    Dans,
    Fonction,
    Retour,
    Stop,
    Suivant,
    Essayer,
    Sauf,
    Erreur,
    Importer,
    Et,
    Ou,
    Non,

    // Literals
    Identifier(String),
    Str(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    SlashSlash,
    Percent,
    StarStar,
    Assign,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,

    // Delimiters
    Colon,
    Comma,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Dot,

    // Layout
    Newline,
    Indent,
    Dedent,
    Eof,
}

impl TokenKind {
    /// Short name used in "expected X, got Y" diagnostics.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Miaou => "'miaou'".to_string(),
            TokenKind::Meow => "'meow'".to_string(),
            TokenKind::Si => "'si'".to_string(),
            TokenKind::Alors => "'alors'".to_string(),
            TokenKind::Sinon => "'sinon'".to_string(),
            TokenKind::SinonSi => "'sinon si'".to_string(),
            TokenKind::TantQue => "'tant que'".to_string(),
            TokenKind::Repeter => "'repeter'".to_string(),
            TokenKind::Fois => "'fois'".to_string(),
            TokenKind::PourChaque => "'pour chaque'".to_string(),
            TokenKind::Dans => "'dans'".to_string(),
            TokenKind::Fonction => "'fonction'".to_string(),
            TokenKind::Retour => "'retour'".to_string(),
            TokenKind::Stop => "'stop'".to_string(),
            TokenKind::Suivant => "'suivant'".to_string(),
            TokenKind::Essayer => "'essayer'".to_string(),
            TokenKind::Sauf => "'sauf'".to_string(),
            TokenKind::Erreur => "'erreur'".to_string(),
            TokenKind::Importer => "'importer'".to_string(),
            TokenKind::Et => "'et'".to_string(),
            TokenKind::Ou => "'ou'".to_string(),
            TokenKind::Non => "'non'".to_string(),
            TokenKind::Identifier(name) => format!("identifiant '{name}'"),
            TokenKind::Str(_) => "chaîne".to_string(),
            TokenKind::Integer(_) | TokenKind::Float(_) => "nombre".to_string(),
            TokenKind::Boolean(_) => "booléen".to_string(),
            TokenKind::Plus => "'+'".to_string(),
            TokenKind::Minus => "'-'".to_string(),
            TokenKind::Star => "'*'".to_string(),
            TokenKind::Slash => "'/'".to_string(),
            TokenKind::SlashSlash => "'//'".to_string(),
            TokenKind::Percent => "'%'".to_string(),
            TokenKind::StarStar => "'**'".to_string(),
            TokenKind::Assign => "'='".to_string(),
            TokenKind::Equal => "'=='".to_string(),
            TokenKind::NotEqual => "'!='".to_string(),
            TokenKind::Less => "'<'".to_string(),
            TokenKind::LessEqual => "'<='".to_string(),
            TokenKind::Greater => "'>'".to_string(),
            TokenKind::GreaterEqual => "'>='".to_string(),
            TokenKind::Colon => "':'".to_string(),
            TokenKind::Comma => "','".to_string(),
            TokenKind::LParen => "'('".to_string(),
            TokenKind::RParen => "')'".to_string(),
            TokenKind::LBracket => "'['".to_string(),
            TokenKind::RBracket => "']'".to_string(),
            TokenKind::LBrace => "'{'".to_string(),
            TokenKind::RBrace => "'}'".to_string(),
            TokenKind::Dot => "'.'".to_string(),
            TokenKind::Newline => "fin de ligne".to_string(),
            TokenKind::Indent => "bloc indenté".to_string(),
            TokenKind::Dedent => "fin de bloc".to_string(),
            TokenKind::Eof => "fin de fichier".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub pos: Position,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, pos: Position) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            pos,
        }
    }
}

/// Maps a lowercased single word to its keyword kind, if any.
///
/// `tant`, `pour` and `demander` are not keywords on their own; they only
/// gain meaning through the composite table below.
pub fn keyword(word: &str) -> Option<TokenKind> {
    let kind = match word {
        "miaou" => TokenKind::Miaou,
        "meow" => TokenKind::Meow,
        "si" => TokenKind::Si,
        "alors" => TokenKind::Alors,
        "sinon" => TokenKind::Sinon,
        "repeter" => TokenKind::Repeter,
        "fois" => TokenKind::Fois,
        "dans" => TokenKind::Dans,
        "fonction" => TokenKind::Fonction,
        "retour" => TokenKind::Retour,
        "stop" => TokenKind::Stop,
        "suivant" => TokenKind::Suivant,
        "essayer" => TokenKind::Essayer,
        "sauf" => TokenKind::Sauf,
        "erreur" => TokenKind::Erreur,
        "importer" => TokenKind::Importer,
        "et" => TokenKind::Et,
        "ou" => TokenKind::Ou,
        "non" => TokenKind::Non,
        "vrai" => TokenKind::Boolean(true),
        "faux" => TokenKind::Boolean(false),
        _ => return None,
    };
    Some(kind)
}

/// Two-word sequences the lexer folds into a single token. The first three
/// are composite keywords; the `demander` pair are builtin names that happen
/// to contain a space, so they fold into one identifier token.
pub fn composite(first: &str, second: &str) -> Option<TokenKind> {
    let kind = match (first, second) {
        ("sinon", "si") => TokenKind::SinonSi,
        ("tant", "que") => TokenKind::TantQue,
        ("pour", "chaque") => TokenKind::PourChaque,
        ("demander", "texte") => TokenKind::Identifier("demander texte".to_string()),
        ("demander", "nombre") => TokenKind::Identifier("demander nombre".to_string()),
        _ => return None,
    };
    Some(kind)
}

/// True when `word` can begin one of the composite sequences.
pub fn starts_composite(word: &str) -> bool {
    matches!(word, "sinon" | "tant" | "pour" | "demander")
}

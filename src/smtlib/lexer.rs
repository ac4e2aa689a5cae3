//! SMT-LIB tokenizer.

use logos::Logos;

#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(skip r"[ \t\n\r\f]+")]
#[logos(skip r";[^\n]*")]
pub enum Token<'a> {
    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[regex(r"[0-9]+", |lex| lex.slice())]
    Numeral(&'a str),

    #[regex(r"[0-9]+\.[0-9]+", |lex| lex.slice())]
    Decimal(&'a str),

    /// `#x...` or `#b...` literal.
    #[regex(r"#x[0-9a-fA-F]+|#b[01]+", |lex| lex.slice())]
    BitVector(&'a str),

    #[regex(r#""([^"]|"")*""#, |lex| lex.slice())]
    String(&'a str),

    #[regex(r"[a-zA-Z~!@$%^&*_+=<>.?/\-][a-zA-Z0-9~!@$%^&*_+=<>.?/\-]*", |lex| lex.slice())]
    Symbol(&'a str),

    /// `|...|`, delimiters included.
    #[regex(r"\|[^|\\]*\|", |lex| lex.slice())]
    QuotedSymbol(&'a str),

    #[regex(r":[a-zA-Z0-9~!@$%^&*_+=<>.?/\-]+", |lex| lex.slice())]
    Keyword(&'a str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_tokens() {
        let mut lexer = Token::lexer("(declare-fun x0 () U)");
        assert_eq!(lexer.next(), Some(Ok(Token::LParen)));
        assert_eq!(lexer.next(), Some(Ok(Token::Symbol("declare-fun"))));
        assert_eq!(lexer.next(), Some(Ok(Token::Symbol("x0"))));
        assert_eq!(lexer.next(), Some(Ok(Token::LParen)));
        assert_eq!(lexer.next(), Some(Ok(Token::RParen)));
        assert_eq!(lexer.next(), Some(Ok(Token::Symbol("U"))));
        assert_eq!(lexer.next(), Some(Ok(Token::RParen)));
        assert_eq!(lexer.next(), None);
    }

    #[test]
    fn test_comments_and_literals() {
        let mut lexer = Token::lexer("; header\n(set-info :status \"sat\") 42 1.5 #b01 |a b|");
        assert_eq!(lexer.next(), Some(Ok(Token::LParen)));
        assert_eq!(lexer.next(), Some(Ok(Token::Symbol("set-info"))));
        assert_eq!(lexer.next(), Some(Ok(Token::Keyword(":status"))));
        assert_eq!(lexer.next(), Some(Ok(Token::String("\"sat\""))));
        assert_eq!(lexer.next(), Some(Ok(Token::RParen)));
        assert_eq!(lexer.next(), Some(Ok(Token::Numeral("42"))));
        assert_eq!(lexer.next(), Some(Ok(Token::Decimal("1.5"))));
        assert_eq!(lexer.next(), Some(Ok(Token::BitVector("#b01"))));
        assert_eq!(lexer.next(), Some(Ok(Token::QuotedSymbol("|a b|"))));
        assert_eq!(lexer.next(), None);
    }
}

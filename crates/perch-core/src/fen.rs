//! FEN (Forsyth-Edwards Notation) field splitting and validation.

use thiserror::Error;

/// Errors from parsing a FEN string.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FenError {
    #[error("invalid FEN: expected 6 fields, got {0}")]
    FieldCount(usize),

    #[error("invalid piece placement: {0}")]
    Placement(String),

    #[error("invalid active color: expected 'w' or 'b', got '{0}'")]
    ActiveColor(String),

    #[error("invalid castling rights: {0}")]
    Castling(String),

    #[error("invalid en passant square: {0}")]
    EnPassant(String),

    #[error("invalid halfmove clock: {0}")]
    HalfmoveClock(String),

    #[error("invalid fullmove number: {0}")]
    FullmoveNumber(String),
}

/// The six validated fields of a FEN string.
///
/// The engine turns this into its internal position; this type only
/// checks the textual form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FenFields {
    /// Rank-8-first placement, e.g. `"rnbqkbnr/pppppppp/8/..."`.
    pub placement: String,
    /// `'w'` or `'b'`.
    pub active_color: char,
    /// `"KQkq"` subset or `"-"`.
    pub castling: String,
    /// Target square such as `"e3"`, or `"-"`.
    pub en_passant: String,
    pub halfmove_clock: u32,
    /// Accepted on input; the engine does not track it.
    pub fullmove_number: u32,
}

impl FenFields {
    /// The standard starting position.
    pub const STARTPOS: &'static str =
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    /// Splits and validates a six-field FEN string.
    pub fn parse(fen: &str) -> Result<Self, FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(FenError::FieldCount(fields.len()));
        }

        Self::check_placement(fields[0])?;

        let active_color = match fields[1] {
            "w" => 'w',
            "b" => 'b',
            other => return Err(FenError::ActiveColor(other.to_string())),
        };

        Self::check_castling(fields[2])?;
        Self::check_en_passant(fields[3])?;

        let halfmove_clock = fields[4]
            .parse::<u32>()
            .map_err(|_| FenError::HalfmoveClock(fields[4].to_string()))?;
        let fullmove_number = fields[5]
            .parse::<u32>()
            .map_err(|_| FenError::FullmoveNumber(fields[5].to_string()))?;

        Ok(FenFields {
            placement: fields[0].to_string(),
            active_color,
            castling: fields[2].to_string(),
            en_passant: fields[3].to_string(),
            halfmove_clock,
            fullmove_number,
        })
    }

    fn check_placement(placement: &str) -> Result<(), FenError> {
        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::Placement(format!(
                "expected 8 ranks, got {}",
                ranks.len()
            )));
        }
        for (i, rank) in ranks.iter().enumerate() {
            let mut squares = 0u32;
            for c in rank.chars() {
                if let Some(d) = c.to_digit(10) {
                    if d == 0 || d > 8 {
                        return Err(FenError::Placement(format!(
                            "invalid skip count '{}' in rank {}",
                            c,
                            8 - i
                        )));
                    }
                    squares += d;
                } else if "pnbrqkPNBRQK".contains(c) {
                    squares += 1;
                } else {
                    return Err(FenError::Placement(format!(
                        "unknown character '{}' in rank {}",
                        c,
                        8 - i
                    )));
                }
            }
            if squares != 8 {
                return Err(FenError::Placement(format!(
                    "rank {} covers {} squares, expected 8",
                    8 - i,
                    squares
                )));
            }
        }
        Ok(())
    }

    fn check_castling(castling: &str) -> Result<(), FenError> {
        if castling == "-" {
            return Ok(());
        }
        if castling.is_empty() || castling.len() > 4 {
            return Err(FenError::Castling(castling.to_string()));
        }
        for c in castling.chars() {
            if !"KQkq".contains(c) {
                return Err(FenError::Castling(format!("unknown character '{}'", c)));
            }
        }
        Ok(())
    }

    fn check_en_passant(ep: &str) -> Result<(), FenError> {
        if ep == "-" {
            return Ok(());
        }
        let bytes = ep.as_bytes();
        let valid = bytes.len() == 2
            && (b'a'..=b'h').contains(&bytes[0])
            && (bytes[1] == b'3' || bytes[1] == b'6');
        if valid {
            Ok(())
        } else {
            Err(FenError::EnPassant(ep.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_startpos() {
        let fen = FenFields::parse(FenFields::STARTPOS).unwrap();
        assert_eq!(fen.active_color, 'w');
        assert_eq!(fen.castling, "KQkq");
        assert_eq!(fen.en_passant, "-");
        assert_eq!(fen.halfmove_clock, 0);
        assert_eq!(fen.fullmove_number, 1);
    }

    #[test]
    fn parse_en_passant_field() {
        let fen =
            FenFields::parse("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1")
                .unwrap();
        assert_eq!(fen.en_passant, "e3");
    }

    #[test]
    fn rejects_wrong_field_count() {
        assert!(matches!(
            FenFields::parse("8/8/8/8/8/8/8/8 w - -"),
            Err(FenError::FieldCount(4))
        ));
    }

    #[test]
    fn rejects_bad_placement() {
        assert!(matches!(
            FenFields::parse("8/8/8/8/8/8/8 w - - 0 1"),
            Err(FenError::Placement(_))
        ));
        assert!(matches!(
            FenFields::parse("8/8/8/8/8/8/8/7 w - - 0 1"),
            Err(FenError::Placement(_))
        ));
        assert!(matches!(
            FenFields::parse("8/8/8/8/8/8/8/6xx w - - 0 1"),
            Err(FenError::Placement(_))
        ));
    }

    #[test]
    fn rejects_bad_active_color() {
        assert!(matches!(
            FenFields::parse("8/8/8/8/8/8/8/8 x KQkq - 0 1"),
            Err(FenError::ActiveColor(_))
        ));
    }

    #[test]
    fn rejects_bad_castling_and_ep() {
        assert!(matches!(
            FenFields::parse("8/8/8/8/8/8/8/8 w KX - 0 1"),
            Err(FenError::Castling(_))
        ));
        assert!(matches!(
            FenFields::parse("8/8/8/8/8/8/8/8 w - e4 0 1"),
            Err(FenError::EnPassant(_))
        ));
    }

    #[test]
    fn rejects_bad_clocks() {
        assert!(matches!(
            FenFields::parse("8/8/8/8/8/8/8/8 w - - x 1"),
            Err(FenError::HalfmoveClock(_))
        ));
        assert!(matches!(
            FenFields::parse("8/8/8/8/8/8/8/8 w - - 0 x"),
            Err(FenError::FullmoveNumber(_))
        ));
    }
}

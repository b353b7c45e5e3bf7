use proptest::prelude::*;
use seabattle::{Coord, ModelError};

#[test]
fn parses_corners() {
    let a1 = Coord::parse("A1").unwrap();
    assert_eq!((a1.row(), a1.col()), (0, 0));
    let k10 = Coord::parse("K10").unwrap();
    assert_eq!((k10.row(), k10.col()), (9, 9));
    assert_eq!(k10.index(), 99);
}

#[test]
fn letter_j_is_skipped() {
    assert_eq!(Coord::parse("J5"), Err(ModelError::InvalidCoordinate));
    assert_eq!(Coord::parse("K5").unwrap().row(), 9);
    assert_eq!(Coord::parse("I5").unwrap().row(), 8);
}

#[test]
fn lowercase_letters_accepted() {
    assert_eq!(Coord::parse("b4").unwrap(), Coord::parse("B4").unwrap());
}

#[test]
fn malformed_coordinates_rejected() {
    for bad in ["", "A", "A0", "A11", "A01", "L1", "1A", "AA", "A10x", "B 4", "Z9"] {
        assert_eq!(Coord::parse(bad), Err(ModelError::InvalidCoordinate), "{:?}", bad);
    }
}

#[test]
fn index_round_trip() {
    let b4 = Coord::parse("B4").unwrap();
    assert_eq!(b4.index(), 13);
    assert_eq!(Coord::from_index(13), Some(b4));
    assert_eq!(Coord::from_index(100), None);
    assert_eq!(Coord::all().count(), 100);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn display_parses_back(row in 0usize..10, col in 0usize..10) {
        let coord = Coord::new(row, col).unwrap();
        let text = coord.to_string();
        prop_assert_eq!(Coord::parse(&text), Ok(coord));
    }

    #[test]
    fn arbitrary_text_never_panics(text in "\\PC{0,5}") {
        let _ = Coord::parse(&text);
    }
}

use crate::types::{CastlingSide, Color, File, Rank};

pub const fn castling_rank(c: Color) -> Rank {
    match c {
        Color::White => Rank::R1,
        Color::Black => Rank::R8,
    }
}

pub const fn castling_rook_file(s: CastlingSide) -> File {
    match s {
        CastlingSide::King => File::H,
        CastlingSide::Queen => File::A,
    }
}

/// File where the king lands after castling
pub const fn castling_king_dst_file(s: CastlingSide) -> File {
    match s {
        CastlingSide::King => File::G,
        CastlingSide::Queen => File::C,
    }
}

/// File where the rook lands after castling
pub const fn castling_rook_dst_file(s: CastlingSide) -> File {
    match s {
        CastlingSide::King => File::F,
        CastlingSide::Queen => File::D,
    }
}

pub const fn double_move_src_rank(c: Color) -> Rank {
    match c {
        Color::White => Rank::R2,
        Color::Black => Rank::R7,
    }
}

pub const fn enpassant_src_rank(c: Color) -> Rank {
    match c {
        Color::White => Rank::R5,
        Color::Black => Rank::R4,
    }
}

/// Rank delta of a single pawn step
pub const fn pawn_forward_delta(c: Color) -> isize {
    match c {
        Color::White => 1,
        Color::Black => -1,
    }
}

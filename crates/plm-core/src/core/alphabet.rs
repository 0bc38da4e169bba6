use phf::{Map, phf_map};

/// Number of sequence categories: 20 amino acids plus the gap state.
pub const N_ALPHA: usize = 21;
/// Number of amino-acid categories, excluding the gap state.
pub const N_AMINO: usize = 20;
/// Category index reserved for alignment gaps.
pub const GAP: u8 = 20;

pub const AMINO_ACIDS: [char; N_ALPHA] = [
    'A', 'R', 'N', 'D', 'C', 'Q', 'E', 'G', 'H', 'I', 'L', 'K', 'M', 'F', 'P', 'S', 'T', 'W',
    'Y', 'V', '-',
];

static AMINO_INDICES: Map<u8, u8> = phf_map! {
    b'A' => 0u8,
    b'R' => 1u8,
    b'N' => 2u8,
    b'D' => 3u8,
    b'C' => 4u8,
    b'Q' => 5u8,
    b'E' => 6u8,
    b'G' => 7u8,
    b'H' => 8u8,
    b'I' => 9u8,
    b'L' => 10u8,
    b'K' => 11u8,
    b'M' => 12u8,
    b'F' => 13u8,
    b'P' => 14u8,
    b'S' => 15u8,
    b'T' => 16u8,
    b'W' => 17u8,
    b'Y' => 18u8,
    b'V' => 19u8,
    b'-' => 20u8,
};

pub fn amino_index(c: char) -> Option<u8> {
    if !c.is_ascii() {
        return None;
    }
    AMINO_INDICES.get(&(c.to_ascii_uppercase() as u8)).copied()
}

pub fn amino_char(index: u8) -> Option<char> {
    AMINO_ACIDS.get(index as usize).copied()
}

pub fn is_gap(index: u8) -> bool {
    index == GAP
}

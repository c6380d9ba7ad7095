//! Random nickname generator, used when the config file names no nick.
//!
//! Produces nicknames in the format `AdjectiveNounNN` (e.g. `NeonFox42`).

use rand::RngExt;

const ADJECTIVES: &[&str] = &[
    "Shadow", "Neon", "Cyber", "Lunar", "Solar", "Frost", "Storm", "Pixel", "Ghost", "Hyper",
    "Iron", "Rogue", "Nova", "Onyx", "Azure", "Hex",
];

const NOUNS: &[&str] = &[
    "Fox", "Wolf", "Hawk", "Lynx", "Owl", "Crow", "Bear", "Moth", "Newt", "Crane", "Byte", "Node",
];

pub fn generate_nickname() -> String {
    let mut rng = rand::rng();
    let adj = ADJECTIVES[rng.random_range(0..ADJECTIVES.len())];
    let noun = NOUNS[rng.random_range(0..NOUNS.len())];
    let num: u8 = rng.random_range(0..100);
    format!("{}{}{}", adj, noun, num)
}

//! Story text shown between sets.

/// The chapter revealed after completing set `set` (1-based).
///
/// Sets past the third all find the treasure.
pub fn chapter_text(set: u32) -> &'static str {
    match set {
        0 | 1 => "You enter a mysterious forest...",
        2 => "You discover an ancient temple...",
        3 => "A dragon appears before you...",
        _ => "You find the hidden treasure!",
    }
}

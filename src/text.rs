//! Text splitting for documents that exceed the per-prompt budget.

/// Separators tried in order, coarsest first
const SEPARATORS: &[&str] = &["\n\n", "\n", " "];

/// Split `text` into pieces of at most `max_chars` characters.
///
/// Breaks on paragraph, then line, then word boundaries; a single word longer
/// than `max_chars` is cut on character boundaries. Pieces keep source order
/// and are trimmed; empty pieces are dropped.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    if max_chars == 0 {
        if !text.trim().is_empty() {
            pieces.push(text.trim().to_string());
        }
        return pieces;
    }
    split_recursive(text, SEPARATORS, max_chars, &mut pieces);
    pieces
}

fn split_recursive(text: &str, separators: &[&str], max_chars: usize, out: &mut Vec<String>) {
    if char_len(text) <= max_chars {
        push_trimmed(text, out);
        return;
    }

    let Some((separator, rest)) = separators.split_first() else {
        hard_split(text, max_chars, out);
        return;
    };

    let mut current = String::new();
    for piece in text.split(separator) {
        if piece.trim().is_empty() {
            continue;
        }
        if char_len(piece) > max_chars {
            push_trimmed(&current, out);
            current.clear();
            split_recursive(piece, rest, max_chars, out);
            continue;
        }

        let joined = if current.is_empty() {
            char_len(piece)
        } else {
            char_len(&current) + char_len(separator) + char_len(piece)
        };
        if joined > max_chars {
            push_trimmed(&current, out);
            current = piece.to_string();
        } else {
            if !current.is_empty() {
                current.push_str(separator);
            }
            current.push_str(piece);
        }
    }
    push_trimmed(&current, out);
}

fn hard_split(text: &str, max_chars: usize, out: &mut Vec<String>) {
    let chars: Vec<char> = text.chars().collect();
    for chunk in chars.chunks(max_chars) {
        push_trimmed(&chunk.iter().collect::<String>(), out);
    }
}

fn push_trimmed(text: &str, out: &mut Vec<String>) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

//! Statement text cleanup

/// Normalizes pasted statement text before it goes into a prompt.
///
/// Collapses runs of three or more newlines into a single blank line,
/// collapses runs of spaces and tabs into a single space, and trims the
/// result. Pure and total: never fails, `""` stays `""`.
pub fn normalize(raw: &str) -> String {
    // Newline runs first, so spacing between lines does not hide a run.
    let mut collapsed = String::with_capacity(raw.len());
    let mut newline_run = 0usize;
    for ch in raw.chars() {
        if ch == '\n' {
            newline_run += 1;
            continue;
        }
        flush_newlines(&mut collapsed, newline_run);
        newline_run = 0;
        collapsed.push(ch);
    }
    flush_newlines(&mut collapsed, newline_run);

    let mut out = String::with_capacity(collapsed.len());
    let mut in_gap = false;
    for ch in collapsed.chars() {
        if ch == ' ' || ch == '\t' {
            in_gap = true;
            continue;
        }
        if in_gap {
            out.push(' ');
            in_gap = false;
        }
        out.push(ch);
    }
    if in_gap {
        out.push(' ');
    }

    out.trim().to_string()
}

fn flush_newlines(out: &mut String, run: usize) {
    if run >= 3 {
        out.push_str("\n\n");
    } else {
        for _ in 0..run {
            out.push('\n');
        }
    }
}

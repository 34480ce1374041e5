//! Diff rendering for fixture comparison.

/// Render a line diff between expected and actual step outcomes.
#[must_use]
pub fn render_diff(expected: &[String], actual: &[String]) -> String {
    if expected == actual {
        return String::from("[identical]");
    }

    let mut out = String::new();
    out.push_str("--- expected\n");
    out.push_str("+++ actual\n");
    let steps = expected.len().max(actual.len());
    for i in 0..steps {
        let e = expected.get(i).map_or("<none>", String::as_str);
        let a = actual.get(i).map_or("<none>", String::as_str);
        if e != a {
            out.push_str(&format!("@@ step {} @@\n", i + 1));
            out.push_str(&format!("-{e}\n"));
            out.push_str(&format!("+{a}\n"));
        }
    }
    out
}

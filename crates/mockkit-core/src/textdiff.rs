//! Line-oriented unified diffs for test failure output.

use similar::TextDiff;

/// Renders a unified diff of `a` and `b` with `context` lines around each
/// change. Returns an empty string when the inputs are equal.
///
/// ```
/// let d = mockkit_core::textdiff::unified("old", "new", "a\nb\n", "a\nc\n", 3);
/// assert_eq!(d, "--- old\n+++ new\n@@ -1,2 +1,2 @@\n a\n-b\n+c\n");
/// ```
pub fn unified(from: &str, to: &str, a: &str, b: &str, context: usize) -> String {
    TextDiff::from_lines(a, b)
        .unified_diff()
        .context_radius(context)
        .header(from, to)
        .to_string()
}

/// Like [`unified`] without the `---`/`+++` header. A last line without a
/// trailing newline is terminated with a plain newline instead of the
/// "No newline at end of file" marker.
pub fn unified_ctx(a: &str, b: &str, context: usize) -> String {
    let diff = TextDiff::from_lines(a, b);
    let mut udiff = diff.unified_diff();
    udiff.context_radius(context).missing_newline_hint(false);
    udiff.iter_hunks().map(|hunk| hunk.to_string()).collect()
}

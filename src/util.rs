/// Appends `values` to `out` through `write`, inserting `separator` between
/// consecutive entries.
pub fn push_separated<T, F>(
    out: &mut String,
    values: impl IntoIterator<Item = T>,
    mut write: F,
    separator: &str,
) where
    F: FnMut(&mut String, T),
{
    let mut first = true;
    for value in values {
        if !first {
            out.push_str(separator);
        }
        first = false;
        write(out, value);
    }
}

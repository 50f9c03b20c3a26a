/// Shared utility functions for the HIAC extractor
///
/// Remove characters that are not allowed in file names on common platforms
///
/// Strips `< > : " / \ | ? *` and surrounding whitespace from a caller-chosen
/// output name. The result may be empty; callers decide on a fallback.
///
/// # Examples
///
/// ```
/// use hiac_extract::utils::sanitize_file_name;
///
/// assert_eq!(sanitize_file_name("extracted_info"), "extracted_info");
/// assert_eq!(sanitize_file_name("run 1/2: <final>"), "run 12 final");
/// assert_eq!(sanitize_file_name(" a?b*c "), "abc");
/// ```
pub fn sanitize_file_name(name: &str) -> String {
    const FORBIDDEN: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

    name.chars()
        .filter(|c| !FORBIDDEN.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

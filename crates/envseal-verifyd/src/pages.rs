//! HTML pages served by the verification service.

use envseal_crypto::MatchResult;

/// Static upload form.
pub const INDEX_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>envseal - Data Verification</title>
<style>
  body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
         background: #f4f8f9; color: #1f2328; }
  .outer { width: 65%; min-width: 600px; margin: 2rem auto; padding: 2rem;
           background: #ccecf1; border-radius: 8px; }
  h2 { text-align: center; }
  label { display: inline-block; min-width: 9rem; }
  fieldset { border: none; margin-bottom: 1rem; }
</style>
</head>
<body>
<div class="outer">
  <h2>Data Integrity Verification</h2>
  <form action="/checksum" method="POST" enctype="multipart/form-data">
    <fieldset>
      <label for="dataId">Data Id:</label>
      <input id="dataId" name="dataId" type="text" size="50" maxlength="48"/>
    </fieldset>
    <fieldset>
      <label for="dataFile">Data file:</label>
      <input id="dataFile" name="dataFile" type="file"/>
    </fieldset>
    <fieldset>
      <input type="submit" value="Verify">
    </fieldset>
  </form>
</div>
</body>
</html>
"#;

/// Render the outcome of a check.
pub fn result_page(id: &str, result: &MatchResult) -> String {
    let verdict = if result.is_success() { "Success" } else { "Failed" };
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>envseal - Verification Result</title></head>
<body>
<h2>Verification Result</h2>
<div>
  <p>Data Id: <code>{id}</code></p>
  <p>Result: <strong>{verdict}</strong></p>
  <p>{detail}</p>
</div>
<div><a href="/"><b>Back</b></a></div>
</body>
</html>
"#,
        id = escape_html(id),
        detail = escape_html(&result.to_string()),
    )
}

/// Escape the five HTML-significant characters.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<script>alert("x") & 'y'</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;) &amp; &#39;y&#39;&lt;/script&gt;"
        );
    }

    #[test]
    fn result_page_shows_id_and_verdict() {
        let page = result_page("U1", &MatchResult::Success);
        assert!(page.contains("<code>U1</code>"));
        assert!(page.contains("<strong>Success</strong>"));

        let page = result_page("<b>", &MatchResult::Mismatch);
        assert!(page.contains("&lt;b&gt;"));
        assert!(page.contains("<strong>Failed</strong>"));
    }

    #[test]
    fn index_posts_to_checksum() {
        assert!(INDEX_PAGE.contains(r#"action="/checksum""#));
        assert!(INDEX_PAGE.contains(r#"name="dataId""#));
        assert!(INDEX_PAGE.contains(r#"name="dataFile""#));
    }
}

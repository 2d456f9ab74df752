//! Inlined stylesheet shared by every generated document.

/// Remote web-font stylesheet; omitted when `web_fonts` is off.
pub const WEB_FONTS_LINK: &str = concat!(
    r#"<link rel="preconnect" href="https://fonts.googleapis.com">"#,
    "\n",
    r#"<link rel="preconnect" href="https://fonts.gstatic.com" crossorigin>"#,
    "\n",
    r#"<link href="https://fonts.googleapis.com/css2?family=Inter:wght@300;400;500;600;700;800&family=Poppins:wght@400;600;700&display=swap" rel="stylesheet">"#,
);

/// Document stylesheet. Page boxes are sized for A4 at 96 dpi (794 × 1123 px).
pub const PROFILE_CSS: &str = r#"
:root {
  --bg: #f7f8fc;
  --card: #ffffff;
  --text: #0f172a;
  --muted: #64748b;
  --primary: #6366f1;
  --primary-600: #4f46e5;
  --accent: #a78bfa;
  --blue: #60a5fa;
  --green: #10b981;
  --border: #e5e7eb;
}
* { box-sizing: border-box; margin: 0; padding: 0; }
html, body {
  background: var(--bg);
  color: var(--text);
  font-family: Inter, system-ui, -apple-system, "Segoe UI", Roboto, Helvetica, Arial, sans-serif;
  line-height: 1.55;
  -webkit-print-color-adjust: exact;
  print-color-adjust: exact;
}
@page { size: A4; margin: 0; }
.page {
  width: 794px;
  min-height: 1123px;
  margin: 0 auto;
  padding: 48px 56px 72px;
  position: relative;
  background: var(--card);
  page-break-after: always;
  break-after: page;
  overflow: hidden;
}
.page:last-of-type { page-break-after: auto; break-after: auto; }
.page::before {
  content: "";
  position: absolute;
  top: 0; left: 0; right: 0;
  height: 8px;
  background: linear-gradient(90deg, var(--primary), var(--accent), var(--blue));
}
.page-footer {
  position: absolute;
  left: 56px; right: 56px; bottom: 28px;
  padding-top: 10px;
  border-top: 1px solid var(--border);
  color: var(--muted);
  font-size: 11px;
  text-align: center;
}
h1, h2, h3 { font-family: Poppins, Inter, sans-serif; }

/* Identity card */
.id-card {
  margin: 120px auto 0;
  max-width: 520px;
  padding: 48px 40px;
  border-radius: 24px;
  text-align: center;
  background: linear-gradient(180deg, #ffffff 0%, #f8fafc 100%);
  border: 1px solid var(--border);
  box-shadow: 0 24px 48px rgba(79, 70, 229, 0.12);
}
.id-card h1 { font-size: 32px; margin-top: 24px; }
.id-card .subtitle { font-size: 18px; color: var(--primary-600); margin-top: 6px; }
.id-card .field { justify-content: center; margin-top: 14px; }
.avatar {
  width: 160px;
  height: 160px;
  margin: 0 auto;
  border-radius: 50%;
  overflow: hidden;
  display: flex;
  align-items: center;
  justify-content: center;
  background: linear-gradient(135deg, #6366f1, #8b5cf6);
  color: #ffffff;
  font-size: 56px;
  font-weight: 700;
  border: 4px solid #ffffff;
  box-shadow: 0 8px 24px rgba(99, 102, 241, 0.35);
}
.avatar img { width: 100%; height: 100%; object-fit: cover; }
.avatar.blank { background: #e0e7ff; box-shadow: none; }
.avatar.logo { border-radius: 20px; width: 112px; height: 112px; font-size: 44px; }
.avatar.logo img { object-fit: contain; background: #ffffff; }
.badge {
  display: inline-block;
  padding: 4px 14px;
  border-radius: 999px;
  background: #f3f6ff;
  color: #27357a;
  border: 1px solid #e6eaff;
  font-size: 13px;
  font-weight: 600;
}

/* Headers */
.profile-header { padding-bottom: 18px; margin-bottom: 24px; border-bottom: 2px solid #f1f5f9; }
.profile-header h1 { font-size: 28px; }
.profile-header .subtitle { color: var(--primary-600); font-size: 16px; }
.company-header { display: flex; align-items: center; gap: 24px; margin-bottom: 28px; }
.company-header .avatar { margin: 0; }
.company-header h1 { font-size: 28px; }
.company-header .subtitle { color: var(--muted); font-style: italic; }

/* Sections */
.section { margin-bottom: 24px; }
.section h2 {
  font-size: 17px;
  color: var(--primary-600);
  padding-bottom: 6px;
  margin-bottom: 12px;
  border-bottom: 2px solid #f1f5f9;
}
.field { display: flex; gap: 10px; margin-bottom: 8px; font-size: 14px; }
.field .label { min-width: 140px; color: var(--muted); font-weight: 600; }
.field .value { flex: 1; white-space: pre-wrap; word-break: break-word; }
.field a { color: var(--primary-600); text-decoration: none; }
.callout {
  margin-bottom: 12px;
  padding: 14px 18px;
  border-radius: 12px;
  background: linear-gradient(135deg, #f8fafc 0%, #f1f5f9 100%);
  border-left: 5px solid var(--primary);
  font-size: 14px;
}
.callout .label { display: block; font-weight: 700; color: #1f2a63; margin-bottom: 4px; }
.callout .value { white-space: pre-wrap; word-break: break-word; }
.callout.headline {
  background: linear-gradient(135deg, #f0f9ff 0%, #e0f2fe 100%);
  border-left-color: #0ea5e9;
  color: #0c4a6e;
  font-weight: 600;
}
.callout.current {
  background: linear-gradient(135deg, #f0fdf4 0%, #dcfce7 100%);
  border-left-color: var(--green);
  color: #065f46;
}
.callout.current .label { color: var(--green); }
.paragraph {
  font-size: 14px;
  white-space: pre-wrap;
  word-break: break-word;
  padding: 14px 18px;
  border-radius: 12px;
  background: linear-gradient(135deg, #faf5ff 0%, #f3e8ff 100%);
  border-left: 5px solid #a855f7;
}
.list { list-style: none; font-size: 14px; }
.list li {
  padding: 6px 0 6px 22px;
  position: relative;
  border-bottom: 1px dashed var(--border);
}
.list li::before {
  content: "";
  position: absolute;
  left: 4px; top: 14px;
  width: 8px; height: 8px;
  border-radius: 50%;
  background: linear-gradient(135deg, var(--primary), var(--accent));
}
"#;

/// Full `<head>` contents.
pub fn head(title: &str, web_fonts: bool) -> String {
    let mut out = String::with_capacity(PROFILE_CSS.len() + 512);
    out.push_str("<meta charset=\"utf-8\">\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    out.push_str("<title>");
    out.push_str(title);
    out.push_str("</title>\n");
    if web_fonts {
        out.push_str(WEB_FONTS_LINK);
        out.push('\n');
    }
    out.push_str("<style>");
    out.push_str(PROFILE_CSS);
    out.push_str("</style>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn web_fonts_are_optional() {
        assert!(head("x", true).contains("fonts.googleapis.com"));
        assert!(!head("x", false).contains("fonts.googleapis.com"));
    }

    #[test]
    fn page_box_matches_a4() {
        assert!(PROFILE_CSS.contains("width: 794px"));
        assert!(PROFILE_CSS.contains("min-height: 1123px"));
    }
}

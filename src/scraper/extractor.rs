use crate::scraper::parse::{MAX_CARD_TEXT_CHARS, MAX_TITLE_CHARS};

/// JavaScript snippets evaluated inside the rendered page
pub struct PageScripts;

const CARD_ANCESTOR_DEPTH: usize = 6;
const SUBMOLT_ANCESTOR_DEPTH: usize = 5;
const SUBMOLT_DESCRIPTION_CHARS: usize = 200;

fn js_string(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

impl PageScripts {
    /// Collect `{id, href, title, cardText}` for every post link matching `selector`.
    ///
    /// The card text is the longest ancestor text under the size cap, which is
    /// where author, board and counters live.
    pub fn post_cards(selector: &str, base: &str) -> String {
        let selector = js_string(selector);
        let base = js_string(base.trim_end_matches('/'));

        format!(
            r#"
            (() => {{
                const links = Array.from(document.querySelectorAll({selector}));
                const cards = [];
                for (const a of links) {{
                    const href = a.href || a.getAttribute('href') || '';
                    const match = href.match(/\/post\/([a-f0-9-]{{36}})/i);
                    if (!match) continue;
                    const title = (a.textContent || '').trim().slice(0, {MAX_TITLE_CHARS}) || 'Untitled';
                    let cardText = '';
                    let el = a;
                    for (let i = 0; i < {CARD_ANCESTOR_DEPTH} && el; i++) {{
                        el = el.parentElement;
                        if (el) {{
                            const t = (el.textContent || '').trim();
                            if (t.length > cardText.length && t.length < {MAX_CARD_TEXT_CHARS}) cardText = t;
                        }}
                    }}
                    const full = href.startsWith('http')
                        ? href
                        : {base} + (href.startsWith('/') ? '' : '/') + href;
                    cards.push({{ id: match[1], href: full, title: title, cardText: cardText }});
                }}
                return cards;
            }})()
            "#
        )
    }

    /// Click the "Top" feed tab, returning whether one was found
    pub fn click_top_tab() -> String {
        r#"
        (() => {
            const all = Array.from(document.querySelectorAll('a, button, [role="tab"]'));
            const top = all.find((el) => {
                const t = (el.textContent || '').trim();
                return t === 'Top' || t.includes('Top') || t.includes('🔥');
            });
            if (top && top instanceof HTMLElement) {
                top.click();
                return true;
            }
            return false;
        })()
        "#
        .to_string()
    }

    pub fn scroll_to_bottom() -> String {
        "window.scrollTo(0, document.body.scrollHeight)".to_string()
    }

    /// Collect `{name, description, member_count}` for every board link
    pub fn submolts() -> String {
        format!(
            r#"
            (() => {{
                const links = Array.from(document.querySelectorAll('a[href*="/m/"]'));
                const seen = new Set();
                const boards = [];
                for (const a of links) {{
                    const href = a.href || a.getAttribute('href') || '';
                    const match = href.match(/\/m\/([^/?]+)/);
                    if (!match || seen.has(match[1])) continue;
                    seen.add(match[1]);
                    let description = '';
                    let memberCount = 0;
                    let el = a;
                    for (let i = 0; i < {SUBMOLT_ANCESTOR_DEPTH} && el; i++) {{
                        el = el.parentElement;
                        if (el) {{
                            const t = (el.textContent || '').trim();
                            if (t.length > description.length && t.length < 1000) description = t;
                            const num = t.match(/(\d+)\s*(?:members?|成员)/i);
                            if (num) memberCount = parseInt(num[1], 10) || 0;
                        }}
                    }}
                    boards.push({{
                        name: 'm/' + match[1],
                        description: description.slice(0, {SUBMOLT_DESCRIPTION_CHARS}),
                        member_count: memberCount
                    }});
                }}
                return boards;
            }})()
            "#
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_cards_script_embeds_selector_and_base() {
        let script = PageScripts::post_cards("a[href*=\"/post/\"]", "https://www.moltbook.com/");

        assert!(script.contains("querySelectorAll('a[href*=\"/post/\"]')"));
        assert!(script.contains("'https://www.moltbook.com'"));
        assert!(script.contains("{36}"));
        assert!(script.contains("slice(0, 300)"));
    }

    #[test]
    fn test_js_string_escapes_quotes() {
        assert_eq!(js_string("it's"), "'it\\'s'");
        assert_eq!(js_string("a\\b"), "'a\\\\b'");
    }

    #[test]
    fn test_submolts_script_reports_member_count() {
        let script = PageScripts::submolts();
        assert!(script.contains("member_count"));
        assert!(script.contains("a[href*=\"/m/\"]"));
    }
}

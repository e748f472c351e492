//! Browser-grade request headers.
//!
//! Target sites fingerprint clients aggressively; a bare library user-agent
//! is an instant block. Headers here mirror what a desktop Chromium sends on
//! a top-level navigation, with the user-agent rotated per request.

use std::collections::BTreeMap;

const USER_AGENTS: [&str; 6] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:123.0) Gecko/20100101 Firefox/123.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:122.0) Gecko/20100101 Firefox/122.0",
];

/// A randomly chosen user-agent string.
pub fn random_user_agent() -> &'static str {
    USER_AGENTS[fastrand::usize(..USER_AGENTS.len())]
}

/// Full navigation header set with a rotated user-agent.
pub fn browser_headers() -> BTreeMap<String, String> {
    let user_agent = random_user_agent();

    let mut headers = BTreeMap::new();
    headers.insert(String::from("user-agent"), user_agent.to_owned());
    headers.insert(
        String::from("accept"),
        String::from(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8",
        ),
    );
    headers.insert(
        String::from("accept-language"),
        String::from("es-ES,es;q=0.9,en-US;q=0.8,en;q=0.7"),
    );
    headers.insert(String::from("dnt"), String::from("1"));
    headers.insert(String::from("connection"), String::from("keep-alive"));
    headers.insert(
        String::from("upgrade-insecure-requests"),
        String::from("1"),
    );
    headers.insert(String::from("sec-fetch-dest"), String::from("document"));
    headers.insert(String::from("sec-fetch-mode"), String::from("navigate"));
    headers.insert(String::from("sec-fetch-site"), String::from("none"));
    headers.insert(String::from("sec-fetch-user"), String::from("?1"));
    headers.insert(String::from("cache-control"), String::from("no-cache"));
    headers.insert(String::from("pragma"), String::from("no-cache"));
    headers.insert(
        String::from("referer"),
        String::from("https://www.google.com/"),
    );

    // Chromium UAs also send client hints
    if user_agent.contains("Chrome") {
        headers.insert(
            String::from("sec-ch-ua"),
            String::from("\"Chromium\";v=\"122\", \"Not(A:Brand\";v=\"24\", \"Google Chrome\";v=\"122\""),
        );
        headers.insert(String::from("sec-ch-ua-mobile"), String::from("?0"));
        headers.insert(
            String::from("sec-ch-ua-platform"),
            String::from("\"Windows\""),
        );
    }

    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_include_a_user_agent_and_referer() {
        let headers = browser_headers();

        assert!(headers.contains_key("user-agent"));
        assert_eq!(
            headers.get("referer").map(String::as_str),
            Some("https://www.google.com/")
        );
    }

    #[test]
    fn chrome_agents_carry_client_hints() {
        for _ in 0..32 {
            let headers = browser_headers();
            let ua = headers.get("user-agent").expect("user-agent is present");
            assert_eq!(headers.contains_key("sec-ch-ua"), ua.contains("Chrome"));
        }
    }
}

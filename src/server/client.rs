// src/server/client.rs

/// Injected before `</body>` of every served HTML page.
pub const SCRIPT_TAG: &str = r#"<script src="/__livereload.js"></script>"#;

/// Browser side of the live-reload protocol.
pub const CLIENT_SCRIPT: &str = r#"(function () {
  'use strict';

  var url = (location.protocol === 'https:' ? 'wss://' : 'ws://') + location.host + '/__livereload';
  var ws = new WebSocket(url);

  function refreshStyles() {
    var links = document.querySelectorAll('link[rel="stylesheet"]');
    Array.prototype.forEach.call(links, function (link) {
      var href = link.href.replace(/[?&]livereload=\d+/, '');
      link.href = href + (href.indexOf('?') === -1 ? '?' : '&') + 'livereload=' + Date.now();
    });
  }

  ws.onmessage = function (event) {
    var msg = JSON.parse(event.data);
    if (msg.type === 'reload') {
      location.reload();
    } else if (msg.type === 'css') {
      refreshStyles();
    }
  };

  ws.onclose = function () {
    setTimeout(function () { location.reload(); }, 1000);
  };
})();
"#;

/// Insert [`SCRIPT_TAG`] before the last `</body>`, or append it.
pub fn inject_script_tag(html: &str) -> String {
    let lower = html.to_ascii_lowercase();
    match lower.rfind("</body>") {
        Some(idx) => {
            let mut out = String::with_capacity(html.len() + SCRIPT_TAG.len());
            out.push_str(&html[..idx]);
            out.push_str(SCRIPT_TAG);
            out.push_str(&html[idx..]);
            out
        }
        None => format!("{html}{SCRIPT_TAG}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn injects_before_closing_body() {
        let out = inject_script_tag("<html><BODY><p>hi</p></BODY></html>");
        assert_eq!(
            out,
            format!("<html><BODY><p>hi</p>{SCRIPT_TAG}</BODY></html>")
        );
    }

    #[test]
    fn appends_without_body() {
        assert_eq!(inject_script_tag("<p>x</p>"), format!("<p>x</p>{SCRIPT_TAG}"));
    }
}

//! Spreadsheet CSV export over HTTP

use fichas_core::{SourceError, Tab};
use tracing::info;

use crate::SheetSource;

/// Spreadsheet holding the service records
pub const DEFAULT_SPREADSHEET_ID: &str = "1TU9o9bgZPfZ-aKrxfgUqG03jTZOM3mWl0CCLn5SfwO0";

/// Export URL, `{spreadsheet_id}` and `{gid}` are substituted per tab
pub const DEFAULT_URL_TEMPLATE: &str =
    "https://docs.google.com/spreadsheets/d/{spreadsheet_id}/export?format=csv&gid={gid}";

/// Remote source downloading one tab of a public spreadsheet as CSV.
///
/// The request is blocking and is not retried.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SheetExport {
    pub spreadsheet_id: String,
    pub url_template: String,
}

impl Default for SheetExport {
    fn default() -> Self {
        Self {
            spreadsheet_id: DEFAULT_SPREADSHEET_ID.into(),
            url_template: DEFAULT_URL_TEMPLATE.into(),
        }
    }
}

impl SheetExport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use another spreadsheet
    pub fn spreadsheet_id(mut self, id: impl Into<String>) -> Self {
        self.spreadsheet_id = id.into();
        self
    }

    /// Use another URL template
    pub fn url_template(mut self, template: impl Into<String>) -> Self {
        self.url_template = template.into();
        self
    }

    /// Export URL of a tab
    pub fn url_for(&self, tab: Tab) -> String {
        self.url_template
            .replace("{spreadsheet_id}", &self.spreadsheet_id)
            .replace("{gid}", tab.gid())
    }
}

impl SheetSource for SheetExport {
    fn source_id(&self, tab: Tab) -> String {
        self.url_for(tab)
    }

    fn fetch_csv(&self, tab: Tab) -> Result<Vec<u8>, SourceError> {
        let url = self.url_for(tab);
        info!(tab = tab.slug(), url = %url, "downloading spreadsheet export");

        let unavailable = |reason: String| SourceError::Unavailable {
            source_id: url.clone(),
            reason,
        };

        let response = ureq::get(&url)
            .call()
            .map_err(|err| unavailable(format!("request failed: {err}")))?;

        let body = response
            .into_body()
            .read_to_vec()
            .map_err(|err| unavailable(format!("failed reading response body: {err}")))?;

        info!(tab = tab.slug(), bytes = body.len(), "spreadsheet export downloaded");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DatasetLoader;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve one HTTP response on a local port; returns a URL template for it
    fn serve_once(status: &str, body: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let head = format!(
            "HTTP/1.1 {status}\r\nContent-Type: text/csv\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );

        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            loop {
                line.clear();
                if request.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                    break;
                }
            }
            stream.write_all(head.as_bytes()).unwrap();
            stream.write_all(body).unwrap();
        });

        format!("http://{addr}/{{gid}}.csv")
    }

    #[test]
    fn url_uses_tab_gid() {
        let source = SheetExport::new();
        assert_eq!(
            source.url_for(Tab::Health),
            "https://docs.google.com/spreadsheets/d/1TU9o9bgZPfZ-aKrxfgUqG03jTZOM3mWl0CCLn5SfwO0/export?format=csv&gid=27665281"
        );
    }

    #[test]
    fn custom_template_and_id() {
        let source = SheetExport::new()
            .spreadsheet_id("abc")
            .url_template("http://localhost:9/{spreadsheet_id}/{gid}.csv");
        assert_eq!(source.url_for(Tab::General), "http://localhost:9/abc/0.csv");
        assert_eq!(source.source_id(Tab::Legal), "http://localhost:9/abc/1416239426.csv");
    }

    #[test]
    fn unreachable_host_is_unavailable() {
        // Port 9 (discard) on localhost is closed in test environments
        let source = SheetExport::new().url_template("http://127.0.0.1:9/{gid}.csv");
        let err = source.fetch_csv(Tab::General).unwrap_err();
        match err {
            SourceError::Unavailable { source_id, .. } => {
                assert_eq!(source_id, "http://127.0.0.1:9/0.csv");
            }
            other => panic!("expected Unavailable, got {other:?}"),
        }
    }

    #[test]
    fn downloads_raw_export() {
        let source = SheetExport::new().url_template(serve_once("200 OK", b"Nome Completo\nAna\n"));
        assert_eq!(source.fetch_csv(Tab::General).unwrap(), b"Nome Completo\nAna\n");
    }

    #[test]
    fn error_status_is_unavailable() {
        let source = SheetExport::new().url_template(serve_once("404 Not Found", b""));
        let err = source.fetch_csv(Tab::Health).unwrap_err();
        assert!(matches!(err, SourceError::Unavailable { .. }), "{err:?}");
        assert!(err.source_id().ends_with("/27665281.csv"));
    }

    #[test]
    fn sign_in_page_loads_as_malformed() {
        let page = b"<!DOCTYPE html><html><body>Sign in</body></html>";
        let source = SheetExport::new().url_template(serve_once("200 OK", page));
        let err = DatasetLoader::new(source).load(Tab::General).unwrap_err();
        assert!(matches!(err, SourceError::Malformed { .. }), "{err:?}");
    }

    #[test]
    fn latin1_export_loads_as_malformed() {
        let source = SheetExport::new().url_template(serve_once("200 OK", b"Nome Completo\nJo\xe3o\n"));
        let err = DatasetLoader::new(source).cached().load(Tab::General);
        assert!(matches!(err, Err(SourceError::Malformed { .. })), "{err:?}");
    }
}

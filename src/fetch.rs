//! Portal client: downloads daily export archives.
//!
//! The portal answers a form-encoded POST carrying the requested date with
//! a zip attachment holding exactly one CSV member, encoded in
//! ISO-8859-15. Downloads of a range run strictly one day at a time.

use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;

use anyhow::{Context, Result, ensure};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{Method, Request, Response};
use tracing::{debug, info};
use zip::ZipArchive;

use crate::daily::daily_path;
use crate::dates::day_range;

/// Download endpoint of the RTE éCO2mix portal. Overridable through the
/// `ECO2MIX_URL` environment variable (see the CLI).
pub const DEFAULT_PORTAL_URL: &str = "https://www.rte-france.com/curves/eco2mixDl";

#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}

pub struct BasicClient(reqwest::Client);

impl BasicClient {
    pub fn new() -> Self {
        Self(reqwest::Client::new())
    }
}

impl Default for BasicClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for BasicClient {
    async fn execute(&self, req: Request) -> reqwest::Result<Response> {
        self.0.execute(req).await
    }
}

/// Form body of the portal request for `day` (the portal expects the
/// French `DD/MM/YYYY` date format).
pub fn portal_form_body(day: NaiveDate) -> String {
    format!("date={}", day.format("%d/%m/%Y"))
}

/// Extracts the single CSV member of a daily archive and transcodes it
/// from ISO-8859-15 to UTF-8.
pub fn unpack_daily_archive(bytes: &[u8]) -> Result<String> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).context("daily download is not a zip archive")?;
    ensure!(
        archive.len() == 1,
        "expected one file in the daily archive, found {}",
        archive.len()
    );
    let mut member = archive.by_index(0)?;
    let mut raw = Vec::new();
    member.read_to_end(&mut raw)?;

    let (text, _, _) = encoding_rs::ISO_8859_15.decode(&raw);
    Ok(text.into_owned())
}

/// Fetches one day's export from the portal and returns it as UTF-8 text.
///
/// The requested day may be beyond what the portal serves, in which case
/// the response is not an attachment and this fails.
pub async fn fetch_daily<C: HttpClient>(client: &C, url: &str, day: NaiveDate) -> Result<String> {
    let mut req = Request::new(Method::POST, url.parse()?);
    req.headers_mut().insert(
        CONTENT_TYPE,
        "application/x-www-form-urlencoded".parse()?,
    );
    *req.body_mut() = Some(portal_form_body(day).into());

    let resp = client.execute(req).await?.error_for_status()?;

    // The portal signals a served day with an attachment disposition.
    let disposition = resp
        .headers()
        .get(CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    ensure!(
        disposition.starts_with("attachment"),
        "no daily archive served for {day} (content-disposition: {disposition:?})"
    );

    let bytes = resp.bytes().await?;
    debug!(day = %day, bytes = bytes.len(), "daily archive received");
    unpack_daily_archive(&bytes)
}

/// Downloads every missing daily file in `[start, stop)` into `data_dir`,
/// one request at a time. Days already on disk are skipped. Returns the
/// number of files fetched.
pub async fn download_range<C: HttpClient>(
    client: &C,
    url: &str,
    start: NaiveDate,
    stop: NaiveDate,
    data_dir: &Path,
) -> Result<usize> {
    fs::create_dir_all(data_dir)?;

    let mut fetched = 0;
    for day in day_range(start, stop) {
        let path = daily_path(data_dir, day);
        if path.exists() {
            debug!(day = %day, "already downloaded, skipping");
            continue;
        }
        info!(day = %day, "downloading daily export");
        let text = fetch_daily(client, url, day)
            .await
            .with_context(|| format!("download failed for day {day}"))?;
        fs::write(&path, text).with_context(|| format!("failed to write {}", path.display()))?;
        fetched += 1;
    }
    Ok(fetched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    #[test]
    fn test_portal_form_body_uses_french_date_order() {
        let day = NaiveDate::from_ymd_opt(2012, 2, 29).unwrap();
        assert_eq!(portal_form_body(day), "date=29/02/2012");
    }

    fn zip_with_members(members: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in members {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_unpack_daily_archive_transcodes_latin9() {
        // "Journée du" in ISO-8859-15.
        let archive = zip_with_members(&[(
            "eCO2mix_RTE_2012-02-01.csv",
            b"Journ\xe9e du 01/02/2012\n".as_slice(),
        )]);
        let text = unpack_daily_archive(&archive).unwrap();
        assert!(text.starts_with("Journée du"));
    }

    #[test]
    fn test_unpack_daily_archive_rejects_multiple_members() {
        let archive = zip_with_members(&[("a.csv", b"x".as_slice()), ("b.csv", b"y".as_slice())]);
        assert!(unpack_daily_archive(&archive).is_err());
    }

    #[test]
    fn test_unpack_daily_archive_rejects_garbage() {
        assert!(unpack_daily_archive(b"not a zip").is_err());
    }
}

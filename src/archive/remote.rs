use crate::archive::config::RemoteConfig;
use crate::error::ArchiveError;
use reqwest::Url;
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Metadata row written after a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewIssue {
    pub year: i32,
    pub month: u32,
    pub file_url: String,
}

/// The hosted table and object store both components talk to.
pub trait ArchiveService {
    /// Distinct publication years. Order is not guaranteed.
    fn list_distinct_years(&self) -> Result<Vec<i32>, ArchiveError>;
    /// Distinct months published in `year`. Order is not guaranteed.
    fn list_distinct_months(&self, year: i32) -> Result<Vec<u32>, ArchiveError>;
    fn upload_file(&self, path: &str, bytes: &[u8], content_type: &str)
    -> Result<(), ArchiveError>;
    fn public_url(&self, path: &str) -> String;
    fn insert_record(&self, issue: &NewIssue) -> Result<(), ArchiveError>;
}

impl<T: ArchiveService + ?Sized> ArchiveService for &T {
    fn list_distinct_years(&self) -> Result<Vec<i32>, ArchiveError> {
        (**self).list_distinct_years()
    }

    fn list_distinct_months(&self, year: i32) -> Result<Vec<u32>, ArchiveError> {
        (**self).list_distinct_months(year)
    }

    fn upload_file(
        &self,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<(), ArchiveError> {
        (**self).upload_file(path, bytes, content_type)
    }

    fn public_url(&self, path: &str) -> String {
        (**self).public_url(path)
    }

    fn insert_record(&self, issue: &NewIssue) -> Result<(), ArchiveError> {
        (**self).insert_record(issue)
    }
}

#[derive(Debug, Deserialize)]
struct YearRow {
    year: i32,
}

#[derive(Debug, Deserialize)]
struct MonthRow {
    month: u32,
}

const MAX_ERROR_BODY_CHARS: usize = 300;

/// REST client for the hosted table (`/rest/v1`) and storage (`/storage/v1`) APIs.
pub struct HostedArchive {
    http: Client,
    base_url: Url,
    api_key: String,
    table: String,
    bucket: String,
}

impl HostedArchive {
    pub fn from_config(cfg: &RemoteConfig) -> Result<Self, ArchiveError> {
        let raw = cfg.base_url.trim();
        if raw.is_empty() {
            return Err(ArchiveError::NotConfigured(
                "NEWSARCHIVE_BASE_URL is required".to_string(),
            ));
        }
        let base_url = Url::parse(raw)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| {
                ArchiveError::NotConfigured(format!(
                    "NEWSARCHIVE_BASE_URL is not an http(s) base URL: {raw}"
                ))
            })?;
        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|source| ArchiveError::Transport {
                operation: "client-build",
                source,
            })?;
        Ok(Self {
            http,
            base_url,
            api_key: cfg.api_key.clone(),
            table: cfg.table.clone(),
            bucket: cfg.bucket.clone(),
        })
    }

    /// Append segments to the base URL, percent-encoding each one, so a file
    /// name holding `#`, `?` or spaces stays inside its own path segment.
    fn join<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .extend(segments.into_iter().filter(|s| !s.is_empty()));
        }
        url
    }

    fn table_url(&self) -> Url {
        self.join(["rest", "v1", self.table.as_str()])
    }

    fn object_url(&self, path: &str) -> Url {
        self.join(
            ["storage", "v1", "object", self.bucket.as_str()]
                .into_iter()
                .chain(path.split('/')),
        )
    }

    fn authorize(
        &self,
        builder: reqwest::blocking::RequestBuilder,
    ) -> reqwest::blocking::RequestBuilder {
        if self.api_key.is_empty() {
            return builder;
        }
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    fn query_rows<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        params: &[(&str, String)],
    ) -> Result<Vec<T>, ArchiveError> {
        let request = self
            .authorize(self.http.get(self.table_url()))
            .header("Accept", "application/json")
            .query(params);
        let response = request
            .send()
            .map_err(|source| ArchiveError::Transport { operation, source })?;
        let response = check_status(operation, response)?;
        response.json::<Vec<T>>().map_err(|err| ArchiveError::Decode {
            operation,
            reason: err.to_string(),
        })
    }
}

fn check_status(operation: &'static str, response: Response) -> Result<Response, ArchiveError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(ArchiveError::Rejected {
        operation,
        status: status.as_u16(),
        body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
    })
}

impl ArchiveService for HostedArchive {
    fn list_distinct_years(&self) -> Result<Vec<i32>, ArchiveError> {
        let rows: Vec<YearRow> = self.query_rows(
            "list-years",
            &[
                ("select", "year".to_string()),
                ("order", "year.asc".to_string()),
            ],
        )?;
        Ok(rows.into_iter().map(|row| row.year).collect())
    }

    fn list_distinct_months(&self, year: i32) -> Result<Vec<u32>, ArchiveError> {
        let rows: Vec<MonthRow> = self.query_rows(
            "list-months",
            &[
                ("select", "month".to_string()),
                ("year", format!("eq.{year}")),
                ("order", "month.asc".to_string()),
            ],
        )?;
        Ok(rows.into_iter().map(|row| row.month).collect())
    }

    fn upload_file(
        &self,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<(), ArchiveError> {
        let operation = "upload";
        let response = self
            .authorize(self.http.post(self.object_url(path)))
            .header("Content-Type", content_type)
            .header("x-upsert", "false")
            .body(bytes.to_vec())
            .send()
            .map_err(|source| ArchiveError::Transport { operation, source })?;
        check_status(operation, response)?;
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        self.join(
            ["storage", "v1", "object", "public", self.bucket.as_str()]
                .into_iter()
                .chain(path.split('/')),
        )
        .to_string()
    }

    fn insert_record(&self, issue: &NewIssue) -> Result<(), ArchiveError> {
        let operation = "insert";
        let response = self
            .authorize(self.http.post(self.table_url()))
            .header("Prefer", "return=minimal")
            .json(&[issue])
            .send()
            .map_err(|source| ArchiveError::Transport { operation, source })?;
        check_status(operation, response)?;
        Ok(())
    }
}

#[cfg(test)]
pub mod fake {
    use super::{ArchiveService, NewIssue};
    use crate::error::ArchiveError;
    use std::cell::{Cell, RefCell};
    use std::collections::BTreeMap;

    fn rejected(operation: &'static str) -> ArchiveError {
        ArchiveError::Rejected {
            operation,
            status: 500,
            body: "scripted failure".to_string(),
        }
    }

    /// In-memory service that counts calls and fails on request.
    #[derive(Default)]
    pub struct FakeArchive {
        pub years: Vec<i32>,
        pub months: BTreeMap<i32, Vec<u32>>,
        pub fail_years: bool,
        pub fail_months: bool,
        pub fail_upload: bool,
        pub fail_insert: bool,
        pub year_calls: Cell<usize>,
        pub month_calls: RefCell<Vec<i32>>,
        pub uploads: RefCell<Vec<(String, usize, String)>>,
        pub inserts: RefCell<Vec<NewIssue>>,
        pub on_call: RefCell<Option<Box<dyn Fn()>>>,
    }

    impl FakeArchive {
        fn fire_hook(&self) {
            if let Some(hook) = self.on_call.borrow().as_ref() {
                hook();
            }
        }
    }

    impl ArchiveService for FakeArchive {
        fn list_distinct_years(&self) -> Result<Vec<i32>, ArchiveError> {
            self.year_calls.set(self.year_calls.get() + 1);
            self.fire_hook();
            if self.fail_years {
                return Err(rejected("list-years"));
            }
            Ok(self.years.clone())
        }

        fn list_distinct_months(&self, year: i32) -> Result<Vec<u32>, ArchiveError> {
            self.month_calls.borrow_mut().push(year);
            self.fire_hook();
            if self.fail_months {
                return Err(rejected("list-months"));
            }
            Ok(self.months.get(&year).cloned().unwrap_or_default())
        }

        fn upload_file(
            &self,
            path: &str,
            bytes: &[u8],
            content_type: &str,
        ) -> Result<(), ArchiveError> {
            self.fire_hook();
            if self.fail_upload {
                return Err(rejected("upload"));
            }
            self.uploads
                .borrow_mut()
                .push((path.to_string(), bytes.len(), content_type.to_string()));
            Ok(())
        }

        fn public_url(&self, path: &str) -> String {
            format!("https://files.example.test/public/newspapers/{path}")
        }

        fn insert_record(&self, issue: &NewIssue) -> Result<(), ArchiveError> {
            self.fire_hook();
            if self.fail_insert {
                return Err(rejected("insert"));
            }
            self.inserts.borrow_mut().push(issue.clone());
            Ok(())
        }
    }
}

//! JSON bodies exchanged with the export API

use serde::{Deserialize, Serialize};

use crate::types::{ExportRequest, ResultChunk};

/// `POST .../export` body
#[derive(Debug, Serialize)]
pub(crate) struct CreateExportBody<'a> {
    pub data: CreateExportData<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateExportData<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub attributes: CreateExportAttributes<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateExportAttributes<'a> {
    pub columns: &'a [String],
    pub dataset: &'a str,
    pub filters: Filters,
    pub formats: &'a [String],
    pub url_expiration_seconds: u64,
}

#[derive(Debug, Serialize)]
pub(crate) struct Filters {
    pub introduced: Introduced,
}

#[derive(Debug, Serialize)]
pub(crate) struct Introduced {
    pub from: String,
    pub to: String,
}

impl<'a> CreateExportBody<'a> {
    pub fn from_request(request: &'a ExportRequest) -> Self {
        Self {
            data: CreateExportData {
                kind: "resource",
                attributes: CreateExportAttributes {
                    columns: &request.columns,
                    dataset: &request.dataset,
                    filters: Filters {
                        introduced: Introduced {
                            from: request.range.start_param(),
                            to: request.range.end_param(),
                        },
                    },
                    formats: &request.formats,
                    url_expiration_seconds: request.url_expiration_secs,
                },
            },
        }
    }
}

/// `POST .../export` response
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ExportCreated {
    #[serde(default)]
    pub data: Option<ExportCreatedData>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ExportCreatedData {
    #[serde(default)]
    pub id: Option<String>,
}

/// `GET .../jobs/export/{id}` response
#[derive(Debug, Default, Deserialize)]
pub(crate) struct JobStatusBody {
    #[serde(default)]
    pub data: Option<JobStatusData>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct JobStatusData {
    #[serde(default)]
    pub attributes: Option<JobStatusAttributes>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct JobStatusAttributes {
    #[serde(default)]
    pub status: Option<String>,
}

impl JobStatusBody {
    /// Status label, `None` when absent or empty
    pub fn status(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|d| d.attributes.as_ref())
            .and_then(|a| a.status.as_deref())
            .filter(|s| !s.is_empty())
    }
}

/// `GET .../export/{id}` response
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ResultListingBody {
    #[serde(default)]
    pub data: Option<ResultListingData>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ResultListingData {
    #[serde(default)]
    pub attributes: Option<ResultListingAttributes>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ResultListingAttributes {
    #[serde(default)]
    pub results: Vec<ResultChunk>,
    #[serde(default)]
    pub row_count: u64,
    #[serde(default)]
    pub status: Option<String>,
}

//! Blocking HTTP collaborators for the mapping and submission APIs

// SPDX-License-Identifier: AGPL-3.0-or-later

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::BufReader;

/// Error type for collaborator I/O
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("fetch failed, {status}, {body}")]
    FetchFailed { status: u16, body: String },
    #[error("submit failed, {status}, {body}")]
    SubmitFailed { status: u16, body: String },
    #[error(transparent)]
    Transport(#[from] Box<ureq::Error>),
    #[error(transparent)]
    Decode(#[from] serde_json::Error),
}

/// GET a JSON document; only `200 OK` is accepted
pub fn fetch_json<T: DeserializeOwned>(url: &str) -> Result<T, Error> {
    log::info!("GET {url}");
    let response = match ureq::get(url).call() {
        Ok(response) => response,
        Err(ureq::Error::Status(status, response)) => {
            return Err(Error::FetchFailed {
                status,
                body: read_body(response),
            })
        }
        Err(e) => return Err(Box::new(e).into()),
    };
    if response.status() != 200 {
        return Err(Error::FetchFailed {
            status: response.status(),
            body: read_body(response),
        });
    }
    log::info!("{} {}", response.status(), response.status_text());
    Ok(serde_json::from_reader(BufReader::new(
        response.into_reader(),
    ))?)
}

/// POST a JSON document; only `201 Created` is accepted
pub fn submit_json<T: Serialize>(url: &str, document: &T) -> Result<(), Error> {
    let body = serde_json::to_string(document)?;
    log::info!("POST {url}");
    let response = match ureq::post(url)
        .set("Content-Type", "application/json")
        .send_string(&body)
    {
        Ok(response) => response,
        Err(ureq::Error::Status(status, response)) => {
            return Err(Error::SubmitFailed {
                status,
                body: read_body(response),
            })
        }
        Err(e) => return Err(Box::new(e).into()),
    };
    if response.status() != 201 {
        return Err(Error::SubmitFailed {
            status: response.status(),
            body: read_body(response),
        });
    }
    log::info!("{} {}", response.status(), response.status_text());
    Ok(())
}

fn read_body(response: ureq::Response) -> String {
    response.into_string().unwrap_or_else(|e| {
        log::warn!("failed to read response body, {e}");
        String::new()
    })
}

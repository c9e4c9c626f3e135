//! Applicant record lifecycle.
//!
//! Creates a primary and a non-primary applicant, checks that the second one
//! leaves the primary designation alone, updates the first and deletes the
//! second.

use super::{Recorder, Suite};
use crate::fixtures;
use crate::models::Category;
use crate::steps::{
    Passed, StepFailure, StepResult, decode_ok, ensure, expect_absent, expect_status, payload,
};
use crate::transport::{ApiResponse, Method, Transport};
use async_trait::async_trait;
use bls_proto::{ApplicantRecord, NewApplicant, paths};

const STEPS: &[&str] = &[
    "create_applicant",
    "create_second_applicant",
    "list_applicants",
    "get_applicant_by_id",
    "get_primary_applicant",
    "update_applicant",
    "verify_applicant_update",
    "delete_applicant",
    "verify_applicant_deleted",
];

/// Suite covering `/applicants`.
pub struct ApplicantsSuite {
    id: String,
    description: String,
}

impl ApplicantsSuite {
    pub fn new() -> Self {
        Self {
            id: "applicants".to_string(),
            description: "Applicant CRUD and primary designation".to_string(),
        }
    }
}

impl Default for ApplicantsSuite {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Suite for ApplicantsSuite {
    fn id(&self) -> &str {
        &self.id
    }

    fn category(&self) -> Category {
        Category::Applicants
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn steps(&self) -> &'static [&'static str] {
        STEPS
    }

    async fn run(&self, transport: &dyn Transport, recorder: &mut Recorder<'_>) {
        let first = recorder.record(
            "create_applicant",
            create(transport, &fixtures::primary_applicant()).await,
        );
        let second = recorder.record(
            "create_second_applicant",
            create(transport, &fixtures::secondary_applicant()).await,
        );

        recorder.record("list_applicants", list(transport).await);

        match first.as_deref() {
            Some(id) => {
                recorder.record("get_applicant_by_id", get_by_id(transport, id).await);
            }
            None => recorder.skip("get_applicant_by_id", "no applicant id captured"),
        }

        recorder.record(
            "get_primary_applicant",
            get_primary(transport, first.as_deref()).await,
        );

        match first.as_deref() {
            Some(id) => {
                recorder.record("update_applicant", update(transport, id).await);
                recorder.record("verify_applicant_update", verify_update(transport, id).await);
            }
            None => {
                recorder.skip("update_applicant", "no applicant id captured");
                recorder.skip("verify_applicant_update", "no applicant id captured");
            }
        }

        let Some(id) = second.as_deref() else {
            recorder.skip("delete_applicant", "no second applicant id captured");
            recorder.skip("verify_applicant_deleted", "no second applicant id captured");
            return;
        };

        if recorder
            .record("delete_applicant", delete(transport, id).await)
            .is_some()
        {
            recorder.record(
                "verify_applicant_deleted",
                verify_deleted(transport, id).await,
            );
        } else {
            recorder.skip("verify_applicant_deleted", "delete_applicant did not pass");
        }
    }
}

async fn create(transport: &dyn Transport, applicant: &NewApplicant) -> StepResult<String> {
    let body = payload(applicant)?;
    let response = transport
        .call(Method::Post, paths::APPLICANTS, Some(&body))
        .await;
    let record: ApplicantRecord = decode_ok(&response)?;

    Ok(Passed::new(
        format!("Created applicant {} ({})", record.full_name(), record.id),
        record.id,
    )
    .with_detail(response.body))
}

async fn list(transport: &dyn Transport) -> StepResult<()> {
    let response = transport.call(Method::Get, paths::APPLICANTS, None).await;
    let records: Vec<ApplicantRecord> = decode_ok(&response)?;
    Ok(Passed::unit(format!("Retrieved {} applicants", records.len())))
}

async fn get_by_id(transport: &dyn Transport, id: &str) -> StepResult<()> {
    let response = transport
        .call(Method::Get, &paths::applicant(id), None)
        .await;
    let record: ApplicantRecord = decode_ok(&response)?;
    ensure(record.id == id, &response, || {
        format!("asked for applicant {id}, got {}", record.id)
    })?;
    Ok(Passed::unit(format!("Retrieved applicant {}", record.full_name())))
}

/// The primary must be the first applicant when its id is known.
async fn get_primary(transport: &dyn Transport, expected: Option<&str>) -> StepResult<()> {
    let response = transport
        .call(Method::Get, paths::PRIMARY_APPLICANT, None)
        .await;
    let record: ApplicantRecord = decode_ok(&response)?;

    ensure(record.is_primary, &response, || {
        format!("applicant {} is not flagged primary", record.id)
    })?;
    if let Some(expected) = expected {
        ensure(record.id == expected, &response, || {
            format!("primary applicant is {}, expected {expected}", record.id)
        })?;
    }

    Ok(Passed::unit(format!("Primary applicant: {}", record.full_name())))
}

async fn update(transport: &dyn Transport, id: &str) -> StepResult<()> {
    let body = payload(&fixtures::updated_applicant())?;
    let response = transport
        .call(Method::Put, &paths::applicant(id), Some(&body))
        .await;
    let record: ApplicantRecord = decode_ok(&response)?;
    check_phone(&record, &response)?;
    Ok(Passed::unit(format!("Updated phone to {}", fixtures::UPDATED_PHONE)))
}

async fn verify_update(transport: &dyn Transport, id: &str) -> StepResult<()> {
    let response = transport
        .call(Method::Get, &paths::applicant(id), None)
        .await;
    let record: ApplicantRecord = decode_ok(&response)?;
    check_phone(&record, &response)?;
    Ok(Passed::unit("Update is visible on fetch"))
}

fn check_phone(record: &ApplicantRecord, response: &ApiResponse) -> Result<(), StepFailure> {
    ensure(
        record.phone.as_deref() == Some(fixtures::UPDATED_PHONE),
        response,
        || {
            format!(
                "phone is {:?}, expected {}",
                record.phone,
                fixtures::UPDATED_PHONE
            )
        },
    )
}

async fn delete(transport: &dyn Transport, id: &str) -> StepResult<()> {
    let response = transport
        .call(Method::Delete, &paths::applicant(id), None)
        .await;
    expect_status(&response, 200)?;
    Ok(Passed::unit(format!("Deleted applicant {id}")))
}

async fn verify_deleted(transport: &dyn Transport, id: &str) -> StepResult<()> {
    let response = transport
        .call(Method::Get, &paths::applicant(id), None)
        .await;
    expect_absent(&response, id, |r: &ApplicantRecord| r.id.as_str())?;
    Ok(Passed::unit(format!(
        "Applicant {id} no longer retrievable (HTTP {})",
        response.status
    )))
}

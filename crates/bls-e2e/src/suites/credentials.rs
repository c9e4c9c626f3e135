//! Login-credential lifecycle.
//!
//! Covers creation, active filtering, primary promotion and the credential
//! test action. The first credential is demoted and then deleted, so the
//! promoted second credential is left as primary for the automation suite.

use super::{Recorder, Suite};
use crate::fixtures;
use crate::models::Category;
use crate::steps::{
    Passed, StepResult, decode_ok, ensure, expect_absent, expect_status, payload,
};
use crate::transport::{Method, Transport};
use async_trait::async_trait;
use bls_proto::{CredentialRecord, CredentialTestResult, NewCredential, paths};

const STEPS: &[&str] = &[
    "create_credential",
    "create_second_credential",
    "list_credentials",
    "list_active_credentials",
    "get_credential_by_id",
    "get_primary_credential",
    "set_primary_credential",
    "verify_primary_promotion",
    "test_credential",
    "update_credential",
    "delete_credential",
    "verify_credential_deleted",
];

/// Suite covering `/credentials`.
pub struct CredentialsSuite {
    id: String,
    description: String,
}

impl CredentialsSuite {
    pub fn new() -> Self {
        Self {
            id: "credentials".to_string(),
            description: "Credential CRUD, active filter and primary promotion".to_string(),
        }
    }
}

impl Default for CredentialsSuite {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Suite for CredentialsSuite {
    fn id(&self) -> &str {
        &self.id
    }

    fn category(&self) -> Category {
        Category::Credentials
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn steps(&self) -> &'static [&'static str] {
        STEPS
    }

    async fn run(&self, transport: &dyn Transport, recorder: &mut Recorder<'_>) {
        let first = recorder.record(
            "create_credential",
            create(transport, &fixtures::primary_credential()).await,
        );
        let second = recorder.record(
            "create_second_credential",
            create(transport, &fixtures::secondary_credential()).await,
        );

        recorder.record("list_credentials", list(transport).await);
        recorder.record("list_active_credentials", list_active(transport).await);

        match first.as_deref() {
            Some(id) => {
                recorder.record("get_credential_by_id", get_by_id(transport, id).await);
            }
            None => recorder.skip("get_credential_by_id", "no credential id captured"),
        }

        recorder.record(
            "get_primary_credential",
            get_primary(transport, first.as_deref()).await,
        );

        match second.as_deref() {
            Some(id) => {
                let promoted = recorder
                    .record("set_primary_credential", set_primary(transport, id).await)
                    .is_some();
                if promoted {
                    recorder.record(
                        "verify_primary_promotion",
                        get_primary(transport, Some(id)).await,
                    );
                } else {
                    recorder.skip(
                        "verify_primary_promotion",
                        "set_primary_credential did not pass",
                    );
                }
            }
            None => {
                recorder.skip("set_primary_credential", "no second credential id captured");
                recorder.skip("verify_primary_promotion", "no second credential id captured");
            }
        }

        let Some(id) = first.as_deref() else {
            for step in [
                "test_credential",
                "update_credential",
                "delete_credential",
                "verify_credential_deleted",
            ] {
                recorder.skip(step, "no credential id captured");
            }
            return;
        };

        recorder.record("test_credential", test_login(transport, id).await);
        recorder.record("update_credential", update(transport, id).await);

        if recorder
            .record("delete_credential", delete(transport, id).await)
            .is_some()
        {
            recorder.record(
                "verify_credential_deleted",
                verify_deleted(transport, id).await,
            );
        } else {
            recorder.skip("verify_credential_deleted", "delete_credential did not pass");
        }
    }
}

async fn create(transport: &dyn Transport, credential: &NewCredential) -> StepResult<String> {
    let body = payload(credential)?;
    let response = transport
        .call(Method::Post, paths::CREDENTIALS, Some(&body))
        .await;
    let record: CredentialRecord = decode_ok(&response)?;

    Ok(Passed::new(
        format!("Created credential {} ({})", record.name, record.id),
        record.id,
    )
    .with_detail(response.body))
}

async fn list(transport: &dyn Transport) -> StepResult<()> {
    let response = transport.call(Method::Get, paths::CREDENTIALS, None).await;
    let records: Vec<CredentialRecord> = decode_ok(&response)?;
    Ok(Passed::unit(format!("Retrieved {} credentials", records.len())))
}

async fn list_active(transport: &dyn Transport) -> StepResult<()> {
    let response = transport
        .call(Method::Get, paths::ACTIVE_CREDENTIALS, None)
        .await;
    let records: Vec<CredentialRecord> = decode_ok(&response)?;

    let inactive: Vec<&str> = records
        .iter()
        .filter(|r| !r.is_active)
        .map(|r| r.id.as_str())
        .collect();
    ensure(inactive.is_empty(), &response, || {
        format!("active filter returned inactive credentials: {}", inactive.join(", "))
    })?;

    Ok(Passed::unit(format!(
        "Retrieved {} active credentials",
        records.len()
    )))
}

async fn get_by_id(transport: &dyn Transport, id: &str) -> StepResult<()> {
    let response = transport
        .call(Method::Get, &paths::credential(id), None)
        .await;
    let record: CredentialRecord = decode_ok(&response)?;
    ensure(record.id == id, &response, || {
        format!("asked for credential {id}, got {}", record.id)
    })?;
    Ok(Passed::unit(format!("Retrieved credential {}", record.name)))
}

async fn get_primary(transport: &dyn Transport, expected: Option<&str>) -> StepResult<()> {
    let response = transport
        .call(Method::Get, paths::PRIMARY_CREDENTIAL, None)
        .await;
    let record: CredentialRecord = decode_ok(&response)?;

    ensure(record.is_primary, &response, || {
        format!("credential {} is not flagged primary", record.id)
    })?;
    if let Some(expected) = expected {
        ensure(record.id == expected, &response, || {
            format!("primary credential is {}, expected {expected}", record.id)
        })?;
    }

    Ok(Passed::unit(format!("Primary credential: {}", record.name)))
}

async fn set_primary(transport: &dyn Transport, id: &str) -> StepResult<()> {
    let response = transport
        .call(Method::Post, &paths::set_primary_credential(id), None)
        .await;
    expect_status(&response, 200)?;
    Ok(Passed::unit(format!("Promoted credential {id} to primary")))
}

async fn test_login(transport: &dyn Transport, id: &str) -> StepResult<()> {
    let response = transport
        .call(Method::Post, &paths::test_credential(id), None)
        .await;
    let result: CredentialTestResult = decode_ok(&response)?;
    let message = result.message.clone().unwrap_or_default();

    ensure(result.is_success(), &response, || {
        format!("credential test reported '{}': {message}", result.status)
    })?;

    Ok(Passed::unit(format!("Credential test: {message}")))
}

async fn update(transport: &dyn Transport, id: &str) -> StepResult<()> {
    let body = payload(&fixtures::updated_credential())?;
    let response = transport
        .call(Method::Put, &paths::credential(id), Some(&body))
        .await;
    let record: CredentialRecord = decode_ok(&response)?;

    ensure(record.name.contains("Updated"), &response, || {
        format!("name is '{}' after update", record.name)
    })?;

    Ok(Passed::unit(format!("Updated name to '{}'", record.name)))
}

async fn delete(transport: &dyn Transport, id: &str) -> StepResult<()> {
    let response = transport
        .call(Method::Delete, &paths::credential(id), None)
        .await;
    expect_status(&response, 200)?;
    Ok(Passed::unit(format!("Deleted credential {id}")))
}

async fn verify_deleted(transport: &dyn Transport, id: &str) -> StepResult<()> {
    let response = transport
        .call(Method::Get, &paths::credential(id), None)
        .await;
    expect_absent(&response, id, |r: &CredentialRecord| r.id.as_str())?;
    Ok(Passed::unit(format!(
        "Credential {id} no longer retrievable (HTTP {})",
        response.status
    )))
}

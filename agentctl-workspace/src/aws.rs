//! [`SecretStore`] adapter for the `aws` CLI (Secrets Manager + SSM).

use serde::Deserialize;

use agentctl_core::{SecretStore, WorkspaceError};

use crate::command::{run_checked, CommandRunner};

const AWS: &str = "aws";

#[derive(Debug, Deserialize)]
struct SecretValue {
    #[serde(rename = "SecretString")]
    secret_string: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ParameterResponse {
    #[serde(rename = "Parameter")]
    parameter: Parameter,
}

#[derive(Debug, Deserialize)]
struct Parameter {
    #[serde(rename = "Value")]
    value: String,
}

pub struct AwsCli<R: CommandRunner> {
    runner: R,
}

impl<R: CommandRunner> AwsCli<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }
}

fn bad_response(args: &[&str], err: &serde_json::Error) -> WorkspaceError {
    WorkspaceError::Tool {
        tool: AWS.to_string(),
        args: args.join(" "),
        stderr: format!("unexpected response: {err}"),
    }
}

impl<R: CommandRunner> SecretStore for AwsCli<R> {
    fn secret(&self, id: &str, region: &str) -> Result<String, WorkspaceError> {
        let args = [
            "secretsmanager",
            "get-secret-value",
            "--secret-id",
            id,
            "--region",
            region,
            "--output",
            "json",
        ];
        let out = run_checked(&self.runner, AWS, &args)?;
        let parsed: SecretValue = serde_json::from_str(&out).map_err(|e| bad_response(&args, &e))?;
        parsed.secret_string.ok_or_else(|| WorkspaceError::Tool {
            tool: AWS.to_string(),
            args: args.join(" "),
            stderr: format!("secret '{id}' has no string value"),
        })
    }

    fn parameter(&self, name: &str, region: &str) -> Result<String, WorkspaceError> {
        let args = [
            "ssm",
            "get-parameter",
            "--name",
            name,
            "--with-decryption",
            "--region",
            region,
            "--output",
            "json",
        ];
        let out = run_checked(&self.runner, AWS, &args)?;
        let parsed: ParameterResponse =
            serde_json::from_str(&out).map_err(|e| bad_response(&args, &e))?;
        Ok(parsed.parameter.value)
    }
}

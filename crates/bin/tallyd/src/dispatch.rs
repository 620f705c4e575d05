//! Line-oriented dispatcher: one JSON interaction per input line.
//!
//! Every line is recorded through [`UsageService::record_invocation`]. When
//! the counted command is the statistics command, the aggregated report is
//! written to the output as pretty-printed JSON.

use serde::Deserialize;
use tally_app::ports::{CommandRepository, UsageRepository, UserRepository};
use tally_app::services::usage_service::{Invocation, UsageService};
use tally_domain::error::TallyError;
use tally_domain::usage::UserUsage;
use tally_domain::user::User;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// An inbound chat message together with its sender.
#[derive(Debug, Deserialize)]
pub struct Interaction {
    pub user: User,
    pub text: String,
}

/// What a single line led to.
#[derive(Debug)]
pub enum Outcome {
    /// Not a known command invocation.
    Ignored,
    /// The invocation was counted.
    Counted(Invocation),
    /// The statistics command was counted and the report produced.
    Report(Vec<UserUsage>),
}

/// Dispatcher errors.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The line is not a valid interaction.
    #[error("malformed interaction: {0}")]
    Json(#[from] serde_json::Error),
    /// Reading input or writing output failed.
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Tally(#[from] TallyError),
}

/// Feeds interactions into the usage service.
pub struct Dispatcher<U, C, S> {
    service: UsageService<U, C, S>,
    statistics_command: String,
}

impl<U, C, S> Dispatcher<U, C, S>
where
    U: UserRepository,
    C: CommandRepository,
    S: UsageRepository,
{
    pub fn new(service: UsageService<U, C, S>, statistics_command: impl Into<String>) -> Self {
        Self {
            service,
            statistics_command: statistics_command.into(),
        }
    }

    pub fn service(&self) -> &UsageService<U, C, S> {
        &self.service
    }

    /// Handle one input line.
    ///
    /// The statistics command is itself counted before the report is built,
    /// so the report always includes the request that produced it.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Json`] for a malformed line and
    /// [`DispatchError::Tally`] when the service fails.
    pub async fn handle_line(&self, line: &str) -> Result<Outcome, DispatchError> {
        let interaction: Interaction = serde_json::from_str(line)?;
        let Some(invocation) = self
            .service
            .record_invocation(interaction.user, &interaction.text)
            .await?
        else {
            return Ok(Outcome::Ignored);
        };

        if invocation.command.name == self.statistics_command {
            let report = self.service.aggregated_report().await?;
            return Ok(Outcome::Report(report));
        }
        Ok(Outcome::Counted(invocation))
    }

    /// Process `reader` line by line until EOF, writing reports to `writer`.
    ///
    /// Blank lines are skipped; malformed lines are logged and skipped.
    /// Returns the number of invocations counted.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Io`] on read/write failures and
    /// [`DispatchError::Tally`] when storage fails.
    pub async fn run<R, W>(&self, reader: R, mut writer: W) -> Result<usize, DispatchError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        let mut counted = 0;

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            match self.handle_line(&line).await {
                Ok(Outcome::Ignored) => {}
                Ok(Outcome::Counted(invocation)) => {
                    counted += 1;
                    tracing::info!(
                        user_id = %invocation.stat.user_id,
                        command = %invocation.command.name,
                        count = invocation.stat.count,
                        "invocation recorded"
                    );
                }
                Ok(Outcome::Report(report)) => {
                    counted += 1;
                    let mut body = serde_json::to_vec_pretty(&report)?;
                    body.push(b'\n');
                    writer.write_all(&body).await?;
                    writer.flush().await?;
                    tracing::info!(users = report.len(), "report written");
                }
                Err(DispatchError::Json(err)) => {
                    tracing::warn!(error = %err, "skipping malformed line");
                }
                Err(err) => return Err(err),
            }
        }

        Ok(counted)
    }
}

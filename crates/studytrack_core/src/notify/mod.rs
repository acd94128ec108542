//! Notification seam for invitation delivery.
//!
//! # Responsibility
//! - Define the mailer contract consumed by the collaboration lifecycle.
//! - Ship a logging stub so core works without a real delivery backend.
//!
//! # Invariants
//! - Delivery failures never fail the inviting operation; callers log and
//!   continue.

use crate::model::collab::CollaboratorRole;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Payload describing one invitation to deliver.
#[derive(Debug, Clone, Copy)]
pub struct InvitationNotice<'a> {
    pub project_title: &'a str,
    pub inviter_email: &'a str,
    pub invitee_email: &'a str,
    pub role: CollaboratorRole,
}

/// Delivery error reported by mailer implementations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailerError {
    Delivery(String),
}

impl Display for MailerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Delivery(message) => write!(f, "invitation delivery failed: {message}"),
        }
    }
}

impl Error for MailerError {}

/// Mailer contract for invitation notifications.
pub trait Mailer: Send + Sync {
    fn send_invitation(&self, notice: &InvitationNotice<'_>) -> Result<(), MailerError>;
}

/// Stub mailer that records the notice in the process log and succeeds.
#[derive(Debug, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send_invitation(&self, notice: &InvitationNotice<'_>) -> Result<(), MailerError> {
        info!(
            "event=invitation_notice module=notify status=ok invitee={} role={} project_title={}",
            notice.invitee_email,
            notice.role.as_str(),
            notice.project_title
        );
        Ok(())
    }
}

//! Context labels supplied by the intent layer and the topics they map to.
//!
//! The label set is closed: parsing an unrecognised label is an error rather
//! than a silent no-op, so a typo in the calling layer surfaces immediately.

use crate::error::{MonitorError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Topic tags accumulated on a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Tracking,
    Account,
    CustomerFrustration,
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tracking => write!(f, "tracking"),
            Self::Account => write!(f, "account"),
            Self::CustomerFrustration => write!(f, "customer_frustration"),
        }
    }
}

/// Context labels the intent classifier can attach to an agent turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextLabel {
    Initial,
    General,
    Troubleshooting,
    CustomerFrustrated,
    TrackingInitial,
    TrackingIssueGeneral,
    TrackingIssueFrustrated,
    TrackingIssueEmail,
    InitialTrackingIssue,
    MultipleContainerTracking,
    InvalidTracking,
    AnalyzingTrackingNumber,
    NeedTrackingInstructions,
    PreTrackingInput,
    SingleTracking,
    BulkUpload,
    BolTracking,
    CarrierIssue,
    PolPodIssue,
    OutdatedDataIssue,
    AutodetectIssue,
    PortCongestion,
    Co2Emissions,
    AccountIssue,
    AccountBlocked,
    AccountIssueFrustrated,
    AccountIssueEmail,
    TeamManagement,
    TeamManagementExisting,
    TeamManagementCreate,
    GeneralEmail,
    PurchaseEmail,
    TrackingPurchase,
    PortCongestionPurchase,
    Co2Purchase,
    GeneralPurchase,
}

/// Label text and variant, in one table so parsing and display agree.
const LABELS: &[(&str, ContextLabel)] = &[
    ("initial", ContextLabel::Initial),
    ("general", ContextLabel::General),
    ("troubleshooting", ContextLabel::Troubleshooting),
    ("customer_frustrated", ContextLabel::CustomerFrustrated),
    ("tracking_initial", ContextLabel::TrackingInitial),
    ("tracking_issue_general", ContextLabel::TrackingIssueGeneral),
    ("tracking_issue_frustrated", ContextLabel::TrackingIssueFrustrated),
    ("tracking_issue_email", ContextLabel::TrackingIssueEmail),
    ("initial_tracking_issue", ContextLabel::InitialTrackingIssue),
    ("multiple_container_tracking", ContextLabel::MultipleContainerTracking),
    ("invalid_tracking", ContextLabel::InvalidTracking),
    ("analyzing_tracking_number", ContextLabel::AnalyzingTrackingNumber),
    ("need_tracking_instructions", ContextLabel::NeedTrackingInstructions),
    ("pre_tracking_input", ContextLabel::PreTrackingInput),
    ("single_tracking", ContextLabel::SingleTracking),
    ("bulk_upload", ContextLabel::BulkUpload),
    ("bol_tracking", ContextLabel::BolTracking),
    ("carrier_issue", ContextLabel::CarrierIssue),
    ("pol_pod_issue", ContextLabel::PolPodIssue),
    ("outdated_data_issue", ContextLabel::OutdatedDataIssue),
    ("autodetect_issue", ContextLabel::AutodetectIssue),
    ("port_congestion", ContextLabel::PortCongestion),
    ("co2_emissions", ContextLabel::Co2Emissions),
    ("account_issue", ContextLabel::AccountIssue),
    ("account_blocked", ContextLabel::AccountBlocked),
    ("account_issue_frustrated", ContextLabel::AccountIssueFrustrated),
    ("account_issue_email", ContextLabel::AccountIssueEmail),
    ("team_management", ContextLabel::TeamManagement),
    ("team_management_existing", ContextLabel::TeamManagementExisting),
    ("team_management_create", ContextLabel::TeamManagementCreate),
    ("general_email", ContextLabel::GeneralEmail),
    ("purchase_email", ContextLabel::PurchaseEmail),
    ("tracking_purchase", ContextLabel::TrackingPurchase),
    ("port_congestion_purchase", ContextLabel::PortCongestionPurchase),
    ("co2_purchase", ContextLabel::Co2Purchase),
    ("general_purchase", ContextLabel::GeneralPurchase),
];

impl ContextLabel {
    /// The topic this label contributes to the conversation, if any.
    ///
    /// # Example
    ///
    /// ```
    /// use loopwatch::conversation::{ContextLabel, Topic};
    ///
    /// assert_eq!(ContextLabel::InvalidTracking.topic(), Some(Topic::Tracking));
    /// assert_eq!(ContextLabel::CustomerFrustrated.topic(), Some(Topic::CustomerFrustration));
    /// assert_eq!(ContextLabel::BulkUpload.topic(), None);
    /// ```
    #[must_use]
    pub fn topic(&self) -> Option<Topic> {
        match self {
            Self::TrackingIssueGeneral | Self::InvalidTracking | Self::TrackingInitial => {
                Some(Topic::Tracking)
            }
            Self::AccountIssue | Self::AccountBlocked => Some(Topic::Account),
            label if label.is_frustrated() => Some(Topic::CustomerFrustration),
            _ => None,
        }
    }

    /// True for every label that marks the customer as frustrated.
    #[must_use]
    pub fn is_frustrated(&self) -> bool {
        self.as_str().contains("frustrated")
    }

    /// Every label, in declaration order.
    pub fn all() -> impl Iterator<Item = ContextLabel> {
        LABELS.iter().map(|(_, label)| *label)
    }

    /// Stable snake_case label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        LABELS
            .iter()
            .find(|(_, label)| label == self)
            .map(|(name, _)| *name)
            .unwrap_or("unknown")
    }
}

impl FromStr for ContextLabel {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim();
        LABELS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(needle))
            .map(|(_, label)| *label)
            .ok_or_else(|| MonitorError::unknown_context(s))
    }
}

impl std::fmt::Display for ContextLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

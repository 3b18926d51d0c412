//! Contract records
//!
//! A [`ContractRecord`] is one row of the official disclosure table as handed
//! over by the loaders: already parsed, but with raw company names and
//! possibly several consortium members in one winner field.
//!
//! A [`BaseRow`] is the same record after preparation (see
//! `entity::base`): one row per consortium participant, with the normalized
//! supplier key and derived attributes attached.

use crate::core::names::normalize_name;
use crate::models::keys::{ContractKey, ProcedureKey, SupplierKey};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Procurement procedure type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcedureType {
    /// Direct award without a competitive process
    #[serde(
        alias = "Adjudicación directa",
        alias = "adjudicacion",
        alias = "adjudicacion_directa"
    )]
    DirectAward,

    /// Restricted invitation to at least three bidders
    #[serde(
        alias = "Invitación a cuando menos tres personas",
        alias = "invitacion"
    )]
    Invitation,

    /// Open public tender
    #[serde(alias = "Licitación pública", alias = "concurso_abierto")]
    OpenTender,

    /// Any label the loaders could not map
    #[serde(other)]
    Other,
}

impl ProcedureType {
    /// Invitations and open tenders are competitive; direct awards are not
    pub fn is_competitive(&self) -> bool {
        matches!(self, ProcedureType::Invitation | ProcedureType::OpenTender)
    }

    pub fn is_direct_award(&self) -> bool {
        matches!(self, ProcedureType::DirectAward)
    }
}

impl Default for ProcedureType {
    fn default() -> Self {
        ProcedureType::Other
    }
}

/// One disclosed contract row, as produced by the loaders
///
/// # Example
/// ```
/// use procurement_risk_core::models::{ContractRecord, ProcedureType};
///
/// let record = ContractRecord::new("EV-1", "C-1", "ACME SA DE CV")
///     .with_procedure_type(ProcedureType::OpenTender)
///     .with_amount(1_000_000.0);
///
/// assert_eq!(record.amount, Some(1_000_000.0));
/// assert!(!record.is_consortium());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractRecord {
    /// Procedure identifier (`num_evento`)
    pub event_id: String,

    /// Contract number within the procedure
    pub contract_number: String,

    /// Winner as written in the source (may be "A / B")
    #[serde(default)]
    pub supplier_name: Option<String>,

    /// Winner tax ID as written in the source
    #[serde(default)]
    pub supplier_tax_id: Option<String>,

    /// Contracting entity (subsidiary) that awarded the contract
    #[serde(default)]
    pub awarding_entity: String,

    /// Subject-matter category ("Goods", "Services", "Public Works", ...)
    #[serde(default)]
    pub subject_matter: String,

    #[serde(default)]
    pub procedure_type: ProcedureType,

    /// Contract amount used for market shares and the final score
    #[serde(default)]
    pub amount: Option<f64>,

    /// Minimum amount of a ranged contract
    #[serde(default)]
    pub amount_min: Option<f64>,

    /// Maximum amount of a ranged contract
    #[serde(default)]
    pub amount_max: Option<f64>,

    /// Invitation / call publication date
    #[serde(default)]
    pub publication_date: Option<NaiveDate>,

    /// Clarification meeting date
    #[serde(default)]
    pub clarification_meeting_date: Option<NaiveDate>,

    /// Proposal receipt date
    #[serde(default)]
    pub proposal_receipt_date: Option<NaiveDate>,

    /// Award (ruling) date
    #[serde(default)]
    pub award_date: Option<NaiveDate>,

    /// Contract signature date
    #[serde(default)]
    pub contract_date: Option<NaiveDate>,

    /// Start of the delivery period
    #[serde(default)]
    pub delivery_start_date: Option<NaiveDate>,

    /// End of the delivery period
    #[serde(default)]
    pub delivery_end_date: Option<NaiveDate>,

    /// Whether the contract had amendments ("Si"/"No")
    #[serde(default)]
    pub had_amendments: Option<String>,
}

impl ContractRecord {
    /// Create a record with only identifiers and winner set
    pub fn new(
        event_id: impl Into<String>,
        contract_number: impl Into<String>,
        supplier_name: impl Into<String>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            contract_number: contract_number.into(),
            supplier_name: Some(supplier_name.into()),
            supplier_tax_id: None,
            awarding_entity: String::new(),
            subject_matter: String::new(),
            procedure_type: ProcedureType::default(),
            amount: None,
            amount_min: None,
            amount_max: None,
            publication_date: None,
            clarification_meeting_date: None,
            proposal_receipt_date: None,
            award_date: None,
            contract_date: None,
            delivery_start_date: None,
            delivery_end_date: None,
            had_amendments: None,
        }
    }

    pub fn with_tax_id(mut self, tax_id: impl Into<String>) -> Self {
        self.supplier_tax_id = Some(tax_id.into());
        self
    }

    pub fn with_segment(
        mut self,
        awarding_entity: impl Into<String>,
        subject_matter: impl Into<String>,
    ) -> Self {
        self.awarding_entity = awarding_entity.into();
        self.subject_matter = subject_matter.into();
        self
    }

    pub fn with_procedure_type(mut self, procedure_type: ProcedureType) -> Self {
        self.procedure_type = procedure_type;
        self
    }

    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_amount_range(mut self, min: f64, max: f64) -> Self {
        self.amount_min = Some(min);
        self.amount_max = Some(max);
        self
    }

    pub fn with_publication_date(mut self, date: NaiveDate) -> Self {
        self.publication_date = Some(date);
        self
    }

    pub fn with_meeting_date(mut self, date: NaiveDate) -> Self {
        self.clarification_meeting_date = Some(date);
        self
    }

    pub fn with_proposal_date(mut self, date: NaiveDate) -> Self {
        self.proposal_receipt_date = Some(date);
        self
    }

    pub fn with_award_date(mut self, date: NaiveDate) -> Self {
        self.award_date = Some(date);
        self
    }

    pub fn with_contract_date(mut self, date: NaiveDate) -> Self {
        self.contract_date = Some(date);
        self
    }

    pub fn with_delivery_period(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.delivery_start_date = Some(start);
        self.delivery_end_date = Some(end);
        self
    }

    pub fn with_amendments(mut self, answer: impl Into<String>) -> Self {
        self.had_amendments = Some(answer.into());
        self
    }

    /// Winner field names more than one company
    pub fn is_consortium(&self) -> bool {
        self.supplier_name
            .as_deref()
            .map_or(false, |name| name.contains('/'))
    }

    pub fn contract_key(&self) -> ContractKey {
        ContractKey::new(self.event_id.clone(), self.contract_number.clone())
    }
}

/// A prepared contract-participant row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaseRow {
    pub record: ContractRecord,

    /// Normalized supplier name; `None` when the winner is unknown
    pub supplier_key: Option<SupplierKey>,

    /// Normalized tax ID
    pub tax_id: Option<String>,

    /// Incorporation date derived from the tax ID
    pub incorporation_date: Option<NaiveDate>,

    /// Subject matter after category aliasing
    pub subject_category: String,

    /// Row was produced by splitting a consortium award
    pub consortium: bool,
}

impl BaseRow {
    pub fn contract_key(&self) -> ContractKey {
        self.record.contract_key()
    }

    pub fn procedure_key(&self) -> ProcedureKey {
        ProcedureKey::new(self.record.event_id.clone())
    }

    pub fn procedure_type(&self) -> ProcedureType {
        self.record.procedure_type
    }

    /// Amendment answer mapped to a boolean; unrecognized answers are `None`
    pub fn amendments_flag(&self) -> Option<bool> {
        let answer = self.record.had_amendments.as_deref()?;
        match normalize_name(answer).as_deref() {
            Some("SI") | Some("YES") | Some("Y") | Some("1") => Some(true),
            Some("NO") | Some("N") | Some("0") => Some(false),
            _ => None,
        }
    }
}

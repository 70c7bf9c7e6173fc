use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
}

pub mod member {
    use super::*;

    /// Request body for registering a member.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberNew {
        pub name: String,
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberView {
        pub id: Uuid,
        pub name: String,
    }
}

pub mod group {
    use super::*;

    /// Request body for creating a group. The acting member is always part
    /// of the group, listed or not.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupNew {
        pub name: String,
        pub member_ids: Vec<Uuid>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupView {
        pub id: Uuid,
        pub name: String,
        pub members: Vec<super::member::MemberView>,
    }

    /// Request body for adding a member to an existing group.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupMemberAdd {
        pub member_id: Uuid,
    }
}

pub mod expense {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ExpenseKind {
        Regular,
        Settlement,
    }

    #[derive(Clone, Copy, Debug, Serialize, Deserialize)]
    pub struct RatioEntry {
        pub member_id: Uuid,
        pub numerator: u32,
        pub denominator: u32,
    }

    #[derive(Clone, Copy, Debug, Serialize, Deserialize)]
    pub struct PercentEntry {
        pub member_id: Uuid,
        pub percent: u32,
    }

    #[derive(Clone, Copy, Debug, Serialize, Deserialize)]
    pub struct ExactEntry {
        pub member_id: Uuid,
        pub amount_minor: i64,
    }

    /// How an expense total is divided; one case per splitting method.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    #[serde(tag = "method", rename_all = "snake_case")]
    pub enum SplitRule {
        Equal { members: Vec<Uuid> },
        Ratio { entries: Vec<RatioEntry> },
        Percentage { entries: Vec<PercentEntry> },
        Exact { entries: Vec<ExactEntry> },
        Lend { to: Uuid },
    }

    /// Request body for recording a structured expense.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        pub payer_id: Uuid,
        pub amount_minor: i64,
        pub description: String,
        pub rule: SplitRule,
        pub source_text: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseCreated {
        pub id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SplitView {
        pub member_id: Uuid,
        pub amount_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseView {
        pub id: Uuid,
        pub group_id: Uuid,
        pub kind: ExpenseKind,
        pub description: String,
        pub amount_minor: i64,
        pub currency: Currency,
        pub payer_id: Uuid,
        pub source_text: Option<String>,
        /// RFC3339 timestamp.
        pub created_at: DateTime<FixedOffset>,
        pub splits: Vec<SplitView>,
    }

    /// Query parameters for listing a group's expenses.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseListQuery {
        pub limit: Option<u64>,
        /// Opaque pagination cursor (base64), from `next_cursor`.
        ///
        /// Newest → older pagination.
        pub cursor: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseListResponse {
        pub expenses: Vec<ExpenseView>,
        /// Opaque cursor for fetching the next page (older items).
        pub next_cursor: Option<String>,
    }
}

pub mod breakdown {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceView {
        pub member_id: Uuid,
        pub paid_minor: i64,
        pub owed_minor: i64,
        pub net_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupBreakdownResponse {
        pub group_id: Uuid,
        pub balances: Vec<BalanceView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupBalanceView {
        pub group_id: Uuid,
        pub paid_minor: i64,
        pub owed_minor: i64,
        pub net_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberBreakdownResponse {
        pub member_id: Uuid,
        pub groups: Vec<GroupBalanceView>,
    }
}

pub mod settlement {
    use super::*;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum SettlementPolicy {
        #[default]
        Strict,
        Advisory,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferView {
        pub debtor_id: Uuid,
        pub creditor_id: Uuid,
        pub amount_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementProposalResponse {
        pub transfers: Vec<TransferView>,
    }

    /// Request body for recording a settlement transfer.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementNew {
        pub debtor_id: Uuid,
        pub creditor_id: Uuid,
        pub amount_minor: i64,
        pub policy: Option<SettlementPolicy>,
    }
}

pub mod chat {
    use super::*;

    /// Free-text expense entry.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ChatMessageNew {
        pub message: String,
    }

    /// The outcome of interpreting a chat message.
    ///
    /// `recorded` is `false` when the interpreter could not produce a valid
    /// candidate; `message` then explains why.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ChatReply {
        pub recorded: bool,
        pub message: String,
        pub expense_id: Option<Uuid>,
    }
}

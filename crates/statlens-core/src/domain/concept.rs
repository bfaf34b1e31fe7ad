use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::domain::{RawStatement, StatementRow};

/// Statement a concept is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    IncomeStatement,
    BalanceSheet,
}

/// Canonical line items the pipeline reconciles provider rows into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Concept {
    Revenue,
    OperatingProfit,
    Pbt,
    Pat,
    SharesOutstanding,
}

impl Concept {
    pub const ALL: [Self; 5] = [
        Self::Revenue,
        Self::OperatingProfit,
        Self::Pbt,
        Self::Pat,
        Self::SharesOutstanding,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Revenue => "Revenue",
            Self::OperatingProfit => "Operating Profit",
            Self::Pbt => "PBT",
            Self::Pat => "PAT",
            Self::SharesOutstanding => "Shares Outstanding",
        }
    }

    /// Operating profit is the only income concept allowed to be absent.
    pub const fn is_required(self) -> bool {
        !matches!(self, Self::OperatingProfit)
    }

    pub const fn alias(self) -> &'static ConceptAlias {
        match self {
            Self::Revenue => &REVENUE,
            Self::OperatingProfit => &OPERATING_PROFIT,
            Self::Pbt => &PBT,
            Self::Pat => &PAT,
            Self::SharesOutstanding => &SHARES_OUTSTANDING,
        }
    }
}

impl Display for Concept {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered provider labels for one concept. Earlier labels take precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConceptAlias {
    pub concept: Concept,
    pub statement: StatementKind,
    pub labels: &'static [&'static str],
}

impl ConceptAlias {
    /// First row in `statement` whose label matches an alias, scanning aliases in order.
    pub fn resolve<'s>(&self, statement: &'s RawStatement) -> Option<&'s StatementRow> {
        self.labels.iter().find_map(|label| statement.row(label))
    }
}

const REVENUE: ConceptAlias = ConceptAlias {
    concept: Concept::Revenue,
    statement: StatementKind::IncomeStatement,
    labels: &[
        "Total Revenue",
        "Revenue",
        "Net Sales",
        "Total Revenues",
        "Operating Revenue",
    ],
};

const OPERATING_PROFIT: ConceptAlias = ConceptAlias {
    concept: Concept::OperatingProfit,
    statement: StatementKind::IncomeStatement,
    labels: &[
        "Operating Income",
        "Operating Profit",
        "Total Operating Income As Reported",
    ],
};

const PBT: ConceptAlias = ConceptAlias {
    concept: Concept::Pbt,
    statement: StatementKind::IncomeStatement,
    labels: &["Pretax Income", "Income Before Tax", "Profit Before Tax"],
};

const PAT: ConceptAlias = ConceptAlias {
    concept: Concept::Pat,
    statement: StatementKind::IncomeStatement,
    labels: &[
        "Net Income",
        "Net Income Common Stockholders",
        "Profit After Tax",
    ],
};

const SHARES_OUTSTANDING: ConceptAlias = ConceptAlias {
    concept: Concept::SharesOutstanding,
    statement: StatementKind::BalanceSheet,
    labels: &["Ordinary Shares Number", "Share Issued"],
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PeriodEnd;

    fn one_period() -> RawStatement {
        RawStatement::new(vec![PeriodEnd::parse("2024-03-31").expect("valid date")])
    }

    #[test]
    fn earlier_alias_wins_over_later_one() {
        let statement = one_period()
            .with_values("Revenue", &[1.0])
            .and_then(|s| s.with_values("Total Revenue", &[2.0]))
            .expect("rows fit");

        let row = Concept::Revenue.alias().resolve(&statement).expect("resolves");
        assert_eq!(row.label, "Total Revenue");
    }

    #[test]
    fn falls_back_to_later_alias() {
        let statement = one_period()
            .with_values("Profit After Tax", &[3.0])
            .expect("row fits");

        let row = Concept::Pat.alias().resolve(&statement).expect("resolves");
        assert_eq!(row.label, "Profit After Tax");
        assert!(Concept::Pbt.alias().resolve(&statement).is_none());
    }

    #[test]
    fn only_operating_profit_is_optional() {
        let optional: Vec<Concept> = Concept::ALL
            .into_iter()
            .filter(|concept| !concept.is_required())
            .collect();
        assert_eq!(optional, vec![Concept::OperatingProfit]);
        assert_eq!(
            Concept::SharesOutstanding.alias().statement,
            StatementKind::BalanceSheet
        );
    }
}

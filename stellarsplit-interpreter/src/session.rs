use std::{collections::HashMap, fmt::Write as _};
use stellarsplit_application::{GroupId, PersonBalance, SettlementService, SettlementServiceError};
use stellarsplit_domain::MemberId;
use stellarsplit_infrastructure::{InMemoryLedger, LedgerError};
use stellarsplit_parser::{Command, ExpenseLine, Program, Statement, StatementWithLine};
use stellarsplit_presentation::{AmountParseError, CurrencyProfile, SettlementPresenter};

const GROUP_NAME: &str = "script";

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("Cannot open ledger: {0}")]
    Setup(#[source] LedgerError),
    #[error("Line {line}: {source}")]
    Amount {
        line: usize,
        source: AmountParseError,
    },
    #[error("Line {line}: {source}")]
    Ledger { line: usize, source: LedgerError },
    #[error("Line {line}: {source}")]
    Settlement {
        line: usize,
        source: SettlementServiceError,
    },
}

/// Replays a parsed script against a fresh in-memory group.
pub struct ScriptSession {
    ledger: InMemoryLedger,
    group: GroupId,
    currency: CurrencyProfile,
}

impl ScriptSession {
    /// Opens a group whose creator is the first declared member.
    pub fn open(members: &[&str], currency: CurrencyProfile) -> Result<Self, ScriptError> {
        let ledger = InMemoryLedger::new();
        let roster: Vec<MemberId> = members.iter().copied().map(MemberId::from).collect();
        let creator = roster
            .first()
            .cloned()
            .ok_or(ScriptError::Setup(LedgerError::TooFewMembers {
                min: stellarsplit_infrastructure::MIN_MEMBERS,
            }))?;
        let group = ledger
            .create_group(creator, GROUP_NAME, roster)
            .map_err(ScriptError::Setup)?;

        Ok(Self {
            ledger,
            group,
            currency,
        })
    }

    /// Executes every statement and returns the accumulated output. When the
    /// script never asks for output, the settlement plan is appended at the end.
    pub fn run(&self, program: &Program<'_>) -> Result<String, ScriptError> {
        let mut output = String::new();
        let mut printed = false;

        for StatementWithLine { line, statement } in &program.statements {
            let line = *line;
            match statement {
                Statement::Expense(expense) => self.record_expense(line, expense)?,
                Statement::Join { member, by } => self
                    .ledger
                    .add_member(self.group, &MemberId::from(*by), MemberId::from(*member))
                    .map_err(|source| ScriptError::Ledger { line, source })?,
                Statement::Leave { member, by } => self
                    .ledger
                    .remove_member(self.group, &MemberId::from(*by), &MemberId::from(*member))
                    .map_err(|source| ScriptError::Ledger { line, source })?,
                Statement::Undo { by } => {
                    self.ledger
                        .cancel_last_expense(self.group, &MemberId::from(*by))
                        .map_err(|source| ScriptError::Ledger { line, source })?;
                }
                Statement::Command(Command::Balances) => {
                    output.push_str(&self.render_balances(line)?);
                    printed = true;
                }
                Statement::Command(Command::Settle) => {
                    output.push_str(&self.render_settlement(line)?);
                    printed = true;
                }
            }
        }

        if !printed {
            let last_line = program.statements.last().map_or(0, |s| s.line);
            output.push_str(&self.render_settlement(last_line)?);
        }

        Ok(output)
    }

    fn record_expense(&self, line: usize, expense: &ExpenseLine<'_>) -> Result<(), ScriptError> {
        let amount = self
            .currency
            .parse_amount(expense.amount)
            .map_err(|source| ScriptError::Amount { line, source })?;

        let split_among: Vec<MemberId> = match &expense.split_among {
            Some(members) => members.iter().copied().map(MemberId::from).collect(),
            None => {
                self.ledger
                    .group(self.group)
                    .map_err(|source| ScriptError::Ledger { line, source })?
                    .members
            }
        };

        let description = format!("line {line}");
        self.ledger
            .add_expense(
                self.group,
                MemberId::from(expense.payer),
                amount,
                split_among,
                &description,
                "",
            )
            .map_err(|source| ScriptError::Ledger { line, source })?;
        Ok(())
    }

    fn render_balances(&self, line: usize) -> Result<String, ScriptError> {
        let service = SettlementService::new(&self.ledger);
        let balances = service
            .balances(self.group)
            .map_err(|source| ScriptError::Settlement { line, source })?;

        let presenter = SettlementPresenter::new(self.currency);
        let no_names: HashMap<MemberId, String> = HashMap::new();
        let table =
            presenter.build_balance_table(&PersonBalance::from_balances(&balances), &no_names);

        let mut out = String::new();
        let _ = writeln!(out, "Balances (line {line})");
        let _ = writeln!(out, "{table}");
        Ok(out)
    }

    // Read-only: the group stays open so later statements still apply.
    fn render_settlement(&self, line: usize) -> Result<String, ScriptError> {
        let service = SettlementService::new(&self.ledger);
        let result = service
            .settlement(self.group)
            .map_err(|source| ScriptError::Settlement { line, source })?;
        let view = SettlementPresenter::new(self.currency).render(&result);

        let mut out = String::new();
        let _ = writeln!(out, "Settlement (line {line})");
        let _ = writeln!(out, "{}", view.balance_table);
        match view.transfer_table {
            Some(transfers) => {
                let _ = writeln!(out, "{transfers}");
            }
            None => {
                let _ = writeln!(out, "Everyone is settled up.\n");
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use stellarsplit_parser::parse_program;

    fn run_script(source: &str) -> Result<String, ScriptError> {
        let program = parse_program(source).expect("script parses");
        let session = ScriptSession::open(&program.members, CurrencyProfile::xlm())?;
        session.run(&program)
    }

    #[rstest]
    fn prints_plan_at_end_when_no_command_given() {
        let output = run_script(
            "MEMBERS A B C\n\
             A paid 90 for A B C\n\
             B paid 60 for A B C\n",
        )
        .expect("script runs");

        assert!(output.starts_with("Settlement (line 3)"));
        assert!(output.contains("C     A             40"));
        assert!(output.contains("C     B             10"));
    }

    #[rstest]
    fn settle_does_not_freeze_the_group() {
        let output = run_script(
            "MEMBERS A B\n\
             A paid 10\n\
             SETTLE\n\
             B paid 10\n\
             SETTLE\n",
        )
        .expect("script runs");

        assert!(output.contains("Settlement (line 3)"));
        assert!(output.contains("B     A              5"));
        assert!(output.contains("Settlement (line 5)"));
        assert!(output.contains("Everyone is settled up."));
    }

    #[rstest]
    fn implicit_split_uses_current_roster() {
        let output = run_script(
            "MEMBERS A B\n\
             JOIN C by A\n\
             A paid 30\n\
             BALANCES\n",
        )
        .expect("script runs");

        assert!(output.starts_with("Balances (line 4)"));
        assert!(output.contains("A                 +20"));
        assert!(output.contains("C                 -10"));
        assert!(!output.contains("Settlement"));
    }

    #[rstest]
    fn undo_removes_last_expense() {
        let output = run_script(
            "MEMBERS A B\n\
             A paid 10\n\
             B paid 4\n\
             UNDO by B\n",
        )
        .expect("script runs");

        assert!(output.contains("B     A              5"));
    }

    #[rstest]
    #[case::unknown_payer("MEMBERS A B\nZ paid 5\n", 2)]
    #[case::undo_by_other_member("MEMBERS A B\nA paid 5\nUNDO by B\n", 3)]
    #[case::leave_with_expenses("MEMBERS A B C\nC paid 5\nLEAVE C by A\n", 3)]
    #[case::join_existing("MEMBERS A B\nJOIN B by A\n", 2)]
    fn ledger_rejections_carry_line_numbers(#[case] source: &str, #[case] expected_line: usize) {
        let err = run_script(source).unwrap_err();

        assert!(matches!(err, ScriptError::Ledger { line, .. } if line == expected_line));
    }

    #[rstest]
    fn too_precise_amount_is_reported() {
        let err = run_script("MEMBERS A B\nA paid 0.00000001\n").unwrap_err();

        assert!(matches!(
            err,
            ScriptError::Amount {
                line: 2,
                source: AmountParseError::TooPrecise { .. }
            }
        ));
    }

    #[rstest]
    fn single_member_script_cannot_open_a_group() {
        let program = parse_program("MEMBERS A\n").expect("script parses");

        let err = ScriptSession::open(&program.members, CurrencyProfile::xlm())
            .err()
            .expect("group needs two members");

        assert!(matches!(
            err,
            ScriptError::Setup(LedgerError::TooFewMembers { .. })
        ));
    }
}

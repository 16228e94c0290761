//! Handlers for the `league` and `member` commands.

use crate::adapter::inbound::cli::command::{
    LeagueCommand, LeagueCreateArgs, LeagueEnrollArgs, MemberCommand, MemberShowArgs,
};
use crate::adapter::inbound::cli::output::Output;
use crate::application::Ledger;
use crate::domain::{LeagueId, MemberId};
use crate::error::Result;

pub async fn execute(ledger: &Ledger, command: LeagueCommand, out: &Output) -> Result<()> {
    match command {
        LeagueCommand::Create(args) => create(ledger, args, out).await,
        LeagueCommand::Enroll(args) => enroll(ledger, args, out).await,
    }
}

pub async fn execute_member(ledger: &Ledger, command: MemberCommand, out: &Output) -> Result<()> {
    match command {
        MemberCommand::Show(args) => show(ledger, args, out).await,
    }
}

async fn create(ledger: &Ledger, args: LeagueCreateArgs, out: &Output) -> Result<()> {
    let league = ledger
        .create_league(&args.name, args.capital, args.max_position)
        .await?;
    out.record("league", &league);
    out.success(&format!("League {} created", league.id));
    out.field("Name", &league.name);
    out.field("Capital", league.starting_capital);
    Ok(())
}

async fn enroll(ledger: &Ledger, args: LeagueEnrollArgs, out: &Output) -> Result<()> {
    let member = ledger
        .enroll_member(LeagueId::new(args.league), &args.user)
        .await?;
    out.record("member", &member);
    out.success(&format!(
        "Member {} enrolled in league {}",
        member.id, member.league_id
    ));
    out.field("Balance", member.current_balance);
    Ok(())
}

async fn show(ledger: &Ledger, args: MemberShowArgs, out: &Output) -> Result<()> {
    let statement = ledger.member_statement(MemberId::new(args.member)).await?;
    out.record("statement", &statement);

    let member = &statement.member;
    out.section(&format!("Member {} ({})", member.id, member.user_id));
    out.field("League", member.league_id);
    out.field("Balance", member.current_balance);
    out.field("Realized pnl", member.total_pnl);
    out.field("Unrealized pnl", statement.unrealized_pnl());
    out.field("Trades", member.total_trades);
    out.field("Win rate", format!("{}%", member.win_rate.round_dp(2)));
    out.field(
        "Rank",
        member
            .rank
            .map_or_else(|| "unranked".to_string(), |r| r.to_string()),
    );

    if !statement.positions.is_empty() {
        out.section("Open positions");
        for p in &statement.positions {
            out.field(
                &p.id.to_string(),
                format!(
                    "{} {} {} @ {} (mark {}, pnl {})",
                    p.market_id,
                    p.outcome,
                    p.shares,
                    p.entry_price,
                    p.current_price,
                    p.unrealized_pnl
                ),
            );
        }
    }
    Ok(())
}

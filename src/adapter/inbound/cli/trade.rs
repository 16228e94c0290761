//! Handler for the `trade` command.

use crate::adapter::inbound::cli::command::TradeArgs;
use crate::adapter::inbound::cli::output::Output;
use crate::application::{Ledger, PositionChange};
use crate::domain::{MemberId, TradeRequest};
use crate::error::Result;

pub async fn execute(ledger: &Ledger, args: TradeArgs, out: &Output) -> Result<()> {
    let request = TradeRequest::new(
        MemberId::new(args.member),
        args.market,
        args.outcome,
        args.side,
        args.shares,
        args.price,
    )
    .with_market_info(args.slug, args.question);

    let receipt = ledger.submit_trade(request).await?;
    out.record("trade", &receipt);
    out.success(&format!("Trade {} recorded", receipt.trade_id));
    out.field("Position", describe(receipt.position));
    out.field("Balance", receipt.new_balance);
    if let Some(pnl) = receipt.pnl {
        out.field("Realized pnl", pnl);
    }
    Ok(())
}

fn describe(change: PositionChange) -> String {
    match change {
        PositionChange::Opened(id) => format!("opened {id}"),
        PositionChange::Increased(id) => format!("increased {id}"),
        PositionChange::Reduced(id) => format!("reduced {id}"),
        PositionChange::Closed(id) => format!("closed {id}"),
        PositionChange::Unbacked => "none held".to_string(),
    }
}

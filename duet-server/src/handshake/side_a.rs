use crate::error::{HandshakeError, HandshakeStage};
use crate::handshake::coordinator::{HandshakeContext, RELAY_CHANNEL_LABEL};
use crate::room::SideChannels;
use tracing::info;

/// Offering side: creates the relay channel and the offer, then applies the
/// answer and the peer's candidates.
pub(crate) async fn run(
    ctx: &HandshakeContext,
    channels: SideChannels,
) -> Result<(), HandshakeError> {
    let SideChannels {
        publish,
        incoming,
        candidates_out,
        candidates_in,
    } = channels;

    let negotiator = ctx.start_negotiator(candidates_out).await?;

    let channel = ctx
        .cancellable(negotiator.create_relay_channel(RELAY_CHANNEL_LABEL))
        .await??;
    ctx.room.set_relay_channel(ctx.side, channel);

    let offer = ctx.cancellable(negotiator.create_offer()).await??;
    ctx.cancellable(negotiator.set_local_description(offer.clone()))
        .await??;
    ctx.publish(HandshakeStage::Offer, publish, offer)?;
    info!("Offer for room '{}' published", ctx.room.id());

    // Nobody may join for a long time; only teardown ends this wait.
    ctx.cancellable(ctx.room.peer_arrived()).await?;

    let answer = ctx.receive(HandshakeStage::Answer, incoming).await?;
    ctx.cancellable(negotiator.set_remote_description(answer))
        .await??;
    info!("Side A of room '{}' applied the answer", ctx.room.id());

    ctx.drain_candidates(&negotiator, candidates_in).await;
    Ok(())
}

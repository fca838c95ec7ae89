use crate::error::{HandshakeError, HandshakeStage};
use crate::handshake::coordinator::HandshakeContext;
use crate::room::SideChannels;
use tracing::info;

/// Answering side: waits for the relay channel from the remote end, answers
/// the offer and applies the peer's candidates.
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

    let offer = ctx.receive(HandshakeStage::Offer, incoming).await?;
    ctx.cancellable(negotiator.set_remote_description(offer))
        .await??;

    let answer = ctx.cancellable(negotiator.create_answer()).await??;
    ctx.cancellable(negotiator.set_local_description(answer.clone()))
        .await??;
    ctx.publish(HandshakeStage::Answer, publish, answer)?;
    info!("Answer for room '{}' published", ctx.room.id());

    ctx.drain_candidates(&negotiator, candidates_in).await;
    Ok(())
}

//! The workflow orchestrator.

use std::sync::Arc;

use wot_attest::{check_reaction, find_vouch_from};
use wot_notify::{dismiss_wot_notifications, NotificationStore};
use wot_types::{NormalizedUsername, SigId, User, UserVersion, WotProof, WotReaction, WotVouch};

use crate::collaborators::{AttestationIssuer, AttestationReader, Identifier, IdentityResolver, VouchRequest};
use crate::error::WotError;

/// Prefix of the reason passed to identification before an interactive vouch.
pub const VOUCH_REASON_PREFIX: &str = "Vouch for";

/// Collaborators a [`WotService`] is built from.
pub struct Collaborators {
    pub resolver: Arc<dyn IdentityResolver>,
    pub identifier: Arc<dyn Identifier>,
    pub issuer: Arc<dyn AttestationIssuer>,
    pub reader: Arc<dyn AttestationReader>,
    pub notifications: Arc<dyn NotificationStore>,
}

/// Runs web-of-trust workflows on behalf of an acting user.
///
/// Cheap to clone; every collaborator is shared.
#[derive(Clone)]
pub struct WotService {
    resolver: Arc<dyn IdentityResolver>,
    identifier: Arc<dyn Identifier>,
    issuer: Arc<dyn AttestationIssuer>,
    reader: Arc<dyn AttestationReader>,
    notifications: Arc<dyn NotificationStore>,
}

impl WotService {
    pub fn new(collaborators: Collaborators) -> Self {
        Self {
            resolver: collaborators.resolver,
            identifier: collaborators.identifier,
            issuer: collaborators.issuer,
            reader: collaborators.reader,
            notifications: collaborators.notifications,
        }
    }

    /// Resolves a username or assertion through the identity resolver.
    pub async fn resolve(&self, name: &str) -> Result<User, WotError> {
        Ok(self.resolver.resolve(name).await?)
    }

    /// Vouches for an already resolved `vouchee`. No identification runs,
    /// so the vouch carries no failing proofs.
    pub async fn vouch(
        &self,
        me: &User,
        vouchee: &User,
        request: VouchRequest,
    ) -> Result<WotVouch, WotError> {
        let request = validate_request(request)?;
        refuse_self_vouch(me, vouchee)?;
        Ok(self.issuer.issue_vouch(me, vouchee, &request, &[]).await?)
    }

    /// Resolves `assertion`, identifies the user it names and vouches for
    /// them.
    ///
    /// # Errors
    ///
    /// Returns [`WotError::TrackingBroke`] without issuing anything if
    /// identification reports broken tracking.
    pub async fn vouch_from_assertion(
        &self,
        me: &User,
        assertion: &str,
        request: VouchRequest,
    ) -> Result<WotVouch, WotError> {
        let request = validate_request(request)?;
        let vouchee = self.resolve(assertion).await?;
        refuse_self_vouch(me, &vouchee)?;

        let reason = format!("{VOUCH_REASON_PREFIX} {assertion}");
        let outcome = self.identifier.identify(&vouchee, &reason).await?;

        if let Some(breaks) = outcome.track_breaks {
            tracing::warn!(
                vouchee = %vouchee.username,
                broken_proofs = breaks.proofs.len(),
                "identification found tracking breaks, not vouching"
            );
            return Err(WotError::TrackingBroke);
        }

        for proof in &outcome.failing_proofs {
            log_failing_proof(&vouchee, proof);
        }

        Ok(self
            .issuer
            .issue_vouch(me, &vouchee, &request, &outcome.failing_proofs)
            .await?)
    }

    /// Reacts to the vouch `voucher` issued for `me`.
    pub async fn react(
        &self,
        me: &User,
        voucher: &UserVersion,
        proof: &SigId,
        reaction: WotReaction,
    ) -> Result<WotVouch, WotError> {
        Ok(self.issuer.issue_reaction(me, voucher, proof, reaction).await?)
    }

    /// Reacts to the vouch the user called `voucher_name` issued for `me`.
    ///
    /// Looks the vouch up among `me`'s received vouches, validates the
    /// reaction against its status, then reacts with its proof.
    pub async fn react_by_voucher_name(
        &self,
        me: &User,
        voucher_name: &str,
        reaction: WotReaction,
    ) -> Result<WotVouch, WotError> {
        let voucher = self.resolve(voucher_name).await?;
        let received = self.reader.list_mine(me).await?;

        let Some(vouch) = find_vouch_from(&received, &voucher.uv) else {
            return Err(WotError::NotFound(voucher_name.to_string()));
        };
        check_reaction(vouch.status, reaction)?;

        self.react(me, &vouch.voucher, &vouch.vouch_proof, reaction)
            .await
    }

    /// Vouches received by `me`.
    pub async fn list_mine(&self, me: &User) -> Result<Vec<WotVouch>, WotError> {
        Ok(self.reader.list_mine(me).await?)
    }

    /// Vouches received by the user called `name`.
    pub async fn list_for(&self, name: &str) -> Result<Vec<WotVouch>, WotError> {
        let user = self.resolve(name).await?;
        Ok(self.reader.list_for(&user).await?)
    }

    /// Dismisses `me`'s pending notifications about the (`voucher`,
    /// `vouchee`) pair and returns how many were dismissed.
    pub async fn dismiss_notifications(
        &self,
        me: &User,
        voucher: &str,
        vouchee: &str,
    ) -> Result<usize, WotError> {
        let voucher = NormalizedUsername::new(voucher);
        let vouchee = NormalizedUsername::new(vouchee);
        Ok(dismiss_wot_notifications(self.notifications.as_ref(), me, &voucher, &vouchee).await?)
    }

    /// Revokes the vouch `me` issued for the user called `vouchee_name`.
    pub async fn revoke(&self, me: &User, vouchee_name: &str) -> Result<WotVouch, WotError> {
        let vouchee = self.resolve(vouchee_name).await?;
        Ok(self.issuer.revoke(me, &vouchee.uv).await?)
    }
}

fn validate_request(mut request: VouchRequest) -> Result<VouchRequest, WotError> {
    if request.vouch_texts.is_empty() {
        return Err(WotError::InvalidArgument(
            "at least one vouch text is required".to_string(),
        ));
    }
    for text in &mut request.vouch_texts {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(WotError::InvalidArgument(
                "vouch texts must not be blank".to_string(),
            ));
        }
        *text = trimmed.to_string();
    }
    Ok(request)
}

fn refuse_self_vouch(me: &User, vouchee: &User) -> Result<(), WotError> {
    if me.uv.uid == vouchee.uv.uid {
        return Err(WotError::InvalidArgument("cannot vouch for yourself".to_string()));
    }
    Ok(())
}

fn log_failing_proof(vouchee: &User, proof: &WotProof) {
    tracing::debug!(
        vouchee = %vouchee.username,
        proof_type = %proof.proof_type,
        name = %proof.name,
        username = %proof.username,
        "vouching despite failing proof"
    );
}

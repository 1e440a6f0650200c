//! `Dispatcher` — the single-threaded state machine that owns one peer's
//! [`LocalNode`] and decides what happens to every envelope it sees,
//! inbound or self-originated (§5).
//!
//! Dispatching never touches a socket. [`Dispatcher::dispatch`] always
//! returns the list of `(NodeRef, Envelope)` pairs still needing a remote
//! send; anything resolved locally is folded back in before returning.
//! The net layer is responsible for framing and delivering those pairs
//! and for calling [`Dispatcher::node_fail`] when a send comes back
//! unreachable.

use rand::Rng;

use skiptree_core::NodeRef;
use skiptree_join::{
    build_st_ask, choose_st_contact, error_reply, fix_from_level, handle_at_seed,
    handle_at_terminus, ping_full_ring, repair_level, start_join, step_fixup_higher, FixupStep,
};
use skiptree_routing::{
    next_hop_by_name, route_by_cpe, route_direct, step_by_numeric, synthesize_missing_dimensions,
    ApplicationPayload, ByNumericOutcome, ByNumericState, ControlPayload, Envelope, IdentityReply,
    IdentityRequest, InsertData, LookupReply, LookupRequest, Payload, PidRange, RoutingStep,
    SnFixupCollected, SnJoinState, SnLeaveReply, SnLeaveRequest, SnPingMessage, StJoinPhase,
    StJoinReplyPhase, StJoinRequest,
};

use crate::app_event::AppEvent;
use crate::error::DispatchError;
use crate::local_node::LocalNode;
use crate::pending::PendingQueue;

/// One peer's routing/protocol engine, wrapped around its [`LocalNode`]
/// and a queue of envelopes deferred on an incomplete neighbour.
pub struct Dispatcher<R> {
    pub node: LocalNode,
    pending: PendingQueue,
    events: Vec<AppEvent>,
    rng: R,
}

impl<R: Rng> Dispatcher<R> {
    #[must_use]
    pub fn new(node: LocalNode, rng: R) -> Self {
        Self {
            node,
            pending: PendingQueue::new(),
            events: Vec::new(),
            rng,
        }
    }

    /// Drain the events accumulated by calls made so far.
    pub fn take_events(&mut self) -> Vec<AppEvent> {
        std::mem::take(&mut self.events)
    }

    /// Resolve one envelope, recursively settling whatever resolves
    /// locally, and return the remote sends still required.
    pub fn dispatch(&mut self, envelope: Envelope) -> Vec<(NodeRef, Envelope)> {
        let mut outbound = Vec::new();
        self.route_and_process(envelope, &mut outbound);
        outbound
    }

    /// A send to `peer` failed; drop it from the neighbourhood (§7,
    /// `PeerUnreachable`).
    pub fn node_fail(&mut self, peer: &NodeRef) {
        if self.node.neighbourhood.remove_neighbour(&peer.name_id) {
            self.events.push(AppEvent::PeerFailed(peer.clone()));
        }
    }

    /// Store `(key, data)` directly, without routing (the "add local
    /// data" CLI command).
    pub fn add_local(&mut self, key: skiptree_core::SpacePart, data: Vec<u8>) -> usize {
        self.node.store.add(key, data)
    }

    /// Route `(key, data)` for insertion, forking disabled, TTL from
    /// config (§4.6 insertion routing).
    pub fn insert_routed(
        &mut self,
        key: skiptree_core::SpacePart,
        data: Vec<u8>,
    ) -> Vec<(NodeRef, Envelope)> {
        let space_part = synthesize_missing_dimensions(&self.node.self_ref.cpe, &key);
        let envelope = Envelope::RouteByCpe {
            space_part,
            limit: PidRange::unbounded(),
            forking: false,
            ttl: self.node.config.default_ttl,
            payload: Payload::Application(ApplicationPayload::InsertData(InsertData { key, data })),
        };
        self.dispatch(envelope)
    }

    /// Route a (possibly forking) lookup over `query`.
    pub fn lookup(&mut self, query: skiptree_core::SpacePart, nonce: u64) -> Vec<(NodeRef, Envelope)> {
        let space_part = synthesize_missing_dimensions(&self.node.self_ref.cpe, &query);
        let envelope = Envelope::RouteByCpe {
            space_part,
            limit: PidRange::unbounded(),
            forking: true,
            ttl: self.node.config.default_ttl,
            payload: Payload::Application(ApplicationPayload::LookupRequest(LookupRequest {
                key: query,
                originator: self.node.self_ref.clone(),
                nonce,
            })),
        };
        self.dispatch(envelope)
    }

    /// Route an `IdentityRequest` towards `target`'s numeric id.
    pub fn ping_numeric(&mut self, target: skiptree_core::NumericID) -> Vec<(NodeRef, Envelope)> {
        let state = ByNumericState::new(target, self.node.self_ref.clone());
        let envelope = Envelope::RouteByNumeric {
            state,
            payload: Payload::Application(ApplicationPayload::IdentityRequest(IdentityRequest {
                from: self.node.self_ref.clone(),
            })),
        };
        self.dispatch(envelope)
    }

    /// Begin a SkipNet join against `seed`.
    pub fn start_join(&mut self, seed: NodeRef) -> Vec<(NodeRef, Envelope)> {
        let (_, envelope) = start_join(self.node.self_ref.clone(), seed);
        self.dispatch(envelope)
    }

    /// Announce this peer's departure to every level-0 ring neighbour.
    /// Refuses if the local store is not yet empty (§9 open question).
    pub fn leave(&mut self) -> Result<Vec<(NodeRef, Envelope)>, DispatchError> {
        if !self.node.store.is_empty() {
            return Err(DispatchError::NonEmptyStore);
        }
        let neighbours = self.node.neighbourhood.ring(0).unique_neighbours();
        let mut outbound = Vec::new();
        for n in neighbours {
            let (to, envelope) = route_direct(
                n,
                Payload::Control(ControlPayload::SnLeaveRequest(SnLeaveRequest {
                    leaving_node: self.node.self_ref.clone(),
                })),
            )
            .remove(0);
            self.route_and_process(envelope, &mut outbound);
            let _ = to;
        }
        self.events.push(AppEvent::LeaveCompleted);
        Ok(outbound)
    }

    /// Heartbeat sweep: expire any stalled join/welcome, then ping every
    /// populated ring level and kick one `fix_from_level(0)` pass (§4.8).
    pub fn heartbeat_tick(&mut self) -> Vec<(NodeRef, Envelope)> {
        let mut outbound = Vec::new();

        if self.node.joiner.is_expired(self.node.config.join_timeout) {
            self.node.joiner.clear();
            self.events
                .push(AppEvent::JoinFailed("join timed out".to_string()));
        }
        if let Some((_, envelope)) = self
            .node
            .welcome
            .expire_if_stale(self.node.config.join_timeout)
        {
            self.route_and_process(envelope, &mut outbound);
        }

        for level in 0..=self.node.neighbourhood.highest_populated_level() {
            for (_, envelope) in ping_full_ring(&self.node.self_ref, &self.node.neighbourhood, level) {
                self.route_and_process(envelope, &mut outbound);
            }
        }
        for (_, envelope) in fix_from_level(&self.node.self_ref, &self.node.neighbourhood, 0) {
            self.route_and_process(envelope, &mut outbound);
        }
        outbound
    }

    fn route_and_process(&mut self, envelope: Envelope, outbound: &mut Vec<(NodeRef, Envelope)>) {
        match envelope {
            Envelope::RouteDirect { dest, payload } => {
                if dest.name_id == self.node.self_ref.name_id {
                    self.process_payload(payload, outbound);
                } else {
                    outbound.push((dest.clone(), Envelope::RouteDirect { dest, payload }));
                }
            }
            Envelope::RouteByName { name_id, payload } => {
                let next = next_hop_by_name(&self.node.self_ref, &self.node.neighbourhood, &name_id);
                if next.name_id == self.node.self_ref.name_id {
                    self.process_payload(payload, outbound);
                } else {
                    outbound.push((next.clone(), Envelope::RouteByName { name_id, payload }));
                }
            }
            Envelope::RouteByNumeric { state, payload } => {
                match step_by_numeric(&self.node.self_ref, &self.node.neighbourhood, state) {
                    ByNumericOutcome::DeliverLocal => self.process_payload(payload, outbound),
                    ByNumericOutcome::DeliverTo(to) => {
                        self.route_and_process(
                            Envelope::RouteDirect { dest: to, payload },
                            outbound,
                        );
                    }
                    ByNumericOutcome::Forward(next, state) => {
                        outbound.push((next, Envelope::RouteByNumeric { state, payload }));
                    }
                }
            }
            Envelope::RouteByPayload { payload } => {
                // No currently-defined payload routes itself this way;
                // treat it as arrived.
                self.process_payload(payload, outbound);
            }
            Envelope::RouteByCpe {
                space_part,
                limit,
                forking,
                ttl,
                payload,
            } => {
                if ttl == 0 {
                    tracing::debug!("dropping RouteByCpe envelope: TTL expired");
                    return;
                }

                let steps = route_by_cpe(
                    &self.node.self_ref,
                    &self.node.self_ref.cpe,
                    self.node.self_ref.partition_id,
                    &self.node.neighbourhood,
                    &space_part,
                    &limit,
                    forking,
                    ttl,
                    &payload,
                );

                let steps = match steps {
                    Ok(steps) => steps,
                    Err(e) => {
                        tracing::warn!(error = %e, "by-cpe routing failed");
                        self.empty_routing(&payload, &e.to_string(), outbound);
                        return;
                    }
                };

                if steps.is_empty() {
                    self.empty_routing(&payload, "no destinations", outbound);
                    return;
                }

                for step in steps {
                    match step {
                        RoutingStep::Deliver { to, envelope } => {
                            if to.name_id == self.node.self_ref.name_id {
                                // `here`-delivery: the envelope has arrived, not
                                // merely hopped. Hand the inner payload straight
                                // to the processor instead of re-routing the
                                // `RouteByCpe` envelope, which would classify
                                // `here=true` again on every recursive call and
                                // just burn TTL down to zero.
                                if let Envelope::RouteByCpe { payload, .. } = envelope {
                                    self.process_payload(payload, outbound);
                                }
                            } else {
                                outbound.push((to, envelope.decremented()));
                            }
                        }
                        RoutingStep::Defer { at, envelope } => {
                            self.pending.defer(at.name_id, envelope);
                        }
                        RoutingStep::Direct { to, envelope } => {
                            outbound.push((to, envelope));
                        }
                    }
                }
            }
        }
    }

    fn empty_routing(&mut self, payload: &Payload, reason: &str, outbound: &mut Vec<(NodeRef, Envelope)>) {
        if let Payload::Application(ApplicationPayload::LookupRequest(req)) = payload {
            let reply = LookupReply::routing_error(req.nonce, reason);
            self.route_and_process(
                Envelope::RouteDirect {
                    dest: req.originator.clone(),
                    payload: Payload::Application(ApplicationPayload::LookupReply(reply)),
                },
                outbound,
            );
        }
    }

    fn process_payload(&mut self, payload: Payload, outbound: &mut Vec<(NodeRef, Envelope)>) {
        match payload {
            Payload::Control(control) => self.process_control(control, outbound),
            Payload::Application(app) => self.process_application(app, outbound),
        }
    }

    fn process_control(&mut self, control: ControlPayload, outbound: &mut Vec<(NodeRef, Envelope)>) {
        match control {
            ControlPayload::SnJoinRequest(req) => match req.state {
                SnJoinState::Seed => {
                    if let Some(forwarded) = handle_at_seed(&self.node.self_ref, req) {
                        self.route_and_process(forwarded, outbound);
                    }
                }
                SnJoinState::Routing => {
                    let (_, envelope) =
                        handle_at_terminus(self.node.neighbourhood.ring(0), &req.joining_node);
                    self.route_and_process(envelope, outbound);
                }
            },
            ControlPayload::SnJoinReply(reply) => {
                let outcome = repair_level(
                    &self.node.self_ref,
                    &mut self.node.neighbourhood,
                    0,
                    &reply.neighbours,
                );
                for (_, envelope) in outcome.pings.into_iter().chain(outcome.fixups) {
                    self.route_and_process(envelope, outbound);
                }

                if let Some(contact) =
                    choose_st_contact(&self.node.self_ref.name_id, self.node.neighbourhood.ring(0))
                {
                    let (_, envelope) = build_st_ask(self.node.self_ref.clone(), contact);
                    self.node.joiner.set_busy();
                    self.route_and_process(envelope, outbound);
                }
            }
            ControlPayload::SnLeaveRequest(req) => {
                self.node
                    .neighbourhood
                    .remove_neighbour(&req.leaving_node.name_id);
                let (_, envelope) = route_direct(
                    req.leaving_node,
                    Payload::Control(ControlPayload::SnLeaveReply(SnLeaveReply {
                        contacted_node: self.node.self_ref.clone(),
                    })),
                )
                .remove(0);
                self.route_and_process(envelope, outbound);
            }
            ControlPayload::SnLeaveReply(reply) => {
                self.events
                    .push(AppEvent::LeaveAcknowledged(reply.contacted_node));
            }
            ControlPayload::SnPingMessage(msg) => {
                self.handle_ping(msg.src, msg.ring_level, outbound);
            }
            ControlPayload::SnPingRequest(req) => {
                let (to, envelope) = route_direct(
                    req.src.clone(),
                    Payload::Control(ControlPayload::SnPingMessage(SnPingMessage {
                        src: self.node.self_ref.clone(),
                        ring_level: req.ring_level,
                    })),
                )
                .remove(0);
                self.route_and_process(envelope, outbound);
                let _ = to;
                self.handle_ping(req.src, req.ring_level, outbound);
            }
            ControlPayload::SnFixupHigher(probe) => {
                match step_fixup_higher(
                    &self.node.self_ref,
                    &self.node.neighbourhood,
                    &probe.src,
                    probe.ring_level,
                    probe.direction,
                ) {
                    FixupStep::Stop => {}
                    FixupStep::Forward(next) => {
                        let (_, envelope) = route_direct(
                            next,
                            Payload::Control(ControlPayload::SnFixupHigher(probe)),
                        )
                        .remove(0);
                        self.route_and_process(envelope, outbound);
                    }
                    FixupStep::FoundHigher { collected, send_to } => {
                        let (_, envelope) = route_direct(
                            send_to,
                            Payload::Control(ControlPayload::SnFixupCollected(SnFixupCollected {
                                ring_level: probe.ring_level,
                                neighbours: collected,
                            })),
                        )
                        .remove(0);
                        self.route_and_process(envelope, outbound);
                    }
                }
            }
            ControlPayload::SnFixupCollected(collected) => {
                let outcome = repair_level(
                    &self.node.self_ref,
                    &mut self.node.neighbourhood,
                    collected.ring_level + 1,
                    &collected.neighbours,
                );
                for (_, envelope) in outcome.pings.into_iter().chain(outcome.fixups) {
                    self.route_and_process(envelope, outbound);
                }
            }
            ControlPayload::StJoinRequest(req) => match req.phase {
                StJoinPhase::Ask => {
                    let ring0 = self.node.neighbourhood.ring(0).clone();
                    let result = self.node.welcome.ask(
                        &self.node.self_ref,
                        &self.node.self_ref.cpe,
                        &self.node.store,
                        &ring0,
                        req.joining_node,
                        &mut self.rng,
                    );
                    match result {
                        Ok((_, envelope)) => self.route_and_process(envelope, outbound),
                        Err(e) => {
                            tracing::warn!(error = %e, "failed to welcome skip-tree join");
                        }
                    }
                }
                StJoinPhase::Accept => match self.node.welcome.accept(&self.node.self_ref, &self.node.store) {
                    Ok((new_cpe, committed_store, _joining_node, envelope)) => {
                        self.node.store = committed_store;
                        self.node.self_ref.cpe = new_cpe;
                        self.route_and_process(envelope, outbound);

                        for level in 0..=self.node.neighbourhood.highest_populated_level() {
                            for (_, e) in
                                ping_full_ring(&self.node.self_ref, &self.node.neighbourhood, level)
                            {
                                self.route_and_process(e, outbound);
                            }
                        }
                        for (_, e) in fix_from_level(&self.node.self_ref, &self.node.neighbourhood, 0) {
                            self.route_and_process(e, outbound);
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to accept skip-tree join");
                        let (_, envelope) = error_reply(req.joining_node, &e.to_string());
                        self.route_and_process(envelope, outbound);
                    }
                },
                StJoinPhase::Error => {}
            },
            ControlPayload::StJoinReply(reply) => match reply.phase {
                StJoinReplyPhase::Propose => {
                    if let (Some(pid), Some(cpe)) = (reply.partition_id, reply.cpe) {
                        self.node.self_ref.partition_id = pid;
                        self.node.self_ref.cpe = cpe;
                    }
                    let mut store = skiptree_store::DataStore::new();
                    for (key, data) in reply.data {
                        store.add(key, data);
                    }
                    self.node.store = store;

                    let (_, envelope) = route_direct(
                        reply.contact,
                        Payload::Control(ControlPayload::StJoinRequest(StJoinRequest {
                            joining_node: self.node.self_ref.clone(),
                            phase: StJoinPhase::Accept,
                        })),
                    )
                    .remove(0);
                    self.route_and_process(envelope, outbound);
                }
                StJoinReplyPhase::Confirm => {
                    self.node.joiner.clear();
                    self.events.push(AppEvent::JoinCompleted);
                }
                StJoinReplyPhase::Error => {}
            },
            ControlPayload::StJoinError(err) => {
                if err.original.joining_node.name_id == self.node.self_ref.name_id {
                    self.node.joiner.clear();
                } else {
                    self.node.welcome.reset();
                }
                self.events.push(AppEvent::JoinFailed(err.reason));
            }
        }
    }

    fn handle_ping(&mut self, src: NodeRef, ring_level: usize, outbound: &mut Vec<(NodeRef, Envelope)>) {
        let incomplete = src.is_st_incomplete();
        let outcome = repair_level(&self.node.self_ref, &mut self.node.neighbourhood, ring_level, &[src.clone()]);
        for (_, envelope) in outcome.pings.into_iter().chain(outcome.fixups) {
            self.route_and_process(envelope, outbound);
        }
        if !incomplete {
            for envelope in self.pending.drain(&src.name_id) {
                self.route_and_process(envelope, outbound);
            }
        }
    }

    fn process_application(&mut self, app: ApplicationPayload, outbound: &mut Vec<(NodeRef, Envelope)>) {
        match app {
            ApplicationPayload::InsertData(insert) => {
                self.node.store.add(insert.key, insert.data);
            }
            ApplicationPayload::LookupRequest(req) => {
                let results: Vec<_> = self
                    .node
                    .store
                    .get(&req.key)
                    .into_iter()
                    .map(|item| (item.space_part.clone(), item.data.clone()))
                    .collect();
                let reply = LookupReply::found(req.nonce, results, vec![self.node.self_ref.clone()]);
                let (_, envelope) = route_direct(
                    req.originator,
                    Payload::Application(ApplicationPayload::LookupReply(reply)),
                )
                .remove(0);
                self.route_and_process(envelope, outbound);
            }
            ApplicationPayload::LookupReply(reply) => {
                self.events.push(AppEvent::LookupReply(reply));
            }
            ApplicationPayload::IdentityRequest(req) => {
                let (_, envelope) = route_direct(
                    req.from,
                    Payload::Application(ApplicationPayload::IdentityReply(IdentityReply {
                        node: self.node.self_ref.clone(),
                    })),
                )
                .remove(0);
                self.route_and_process(envelope, outbound);
            }
            ApplicationPayload::IdentityReply(reply) => {
                self.events.push(AppEvent::IdentityReply(reply));
            }
            ApplicationPayload::Encapsulated(msg) => {
                let inner = *msg.inner_envelope;
                if let Envelope::RouteByName {
                    payload: Payload::Control(ControlPayload::SnJoinRequest(req)),
                    ..
                } = &inner
                {
                    if req.state == SnJoinState::Seed {
                        if let Some(forwarded) = handle_at_seed(&self.node.self_ref, req.clone()) {
                            self.route_and_process(forwarded, outbound);
                        }
                        return;
                    }
                }
                self.route_and_process(inner, outbound);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use skiptree_core::{Component, Cpe, Dimension, NameID, NodeConfig, NumericID, PartitionID, SpacePart, Value};
    use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

    fn node(name: &str) -> NodeRef {
        NodeRef::new(
            NameID::new(name),
            NumericID::from_seed(name.as_bytes()),
            PartitionID::from_raw(0.5),
            SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 9000)),
            Cpe::new(),
        )
    }

    fn fresh() -> Dispatcher<StdRng> {
        let rng = StdRng::seed_from_u64(7);
        Dispatcher::new(LocalNode::new(node("m"), NodeConfig::default()), rng)
    }

    fn point(dim: &str, v: i64) -> SpacePart {
        let mut p = SpacePart::new();
        p.set_component(Component::point(Dimension::new(dim), Value::int(v)));
        p
    }

    #[test]
    fn insert_then_lookup_resolves_entirely_locally_on_a_lone_peer() {
        let mut d = fresh();
        let outbound = d.insert_routed(point("x", 5), b"hello".to_vec());
        assert!(outbound.is_empty());
        assert_eq!(d.node.store.len(), 1);

        let outbound = d.lookup(point("x", 5), 42);
        assert!(outbound.is_empty());

        let events = d.take_events();
        assert_eq!(events.len(), 1);
        match &events[0] {
            AppEvent::LookupReply(reply) => {
                assert_eq!(reply.nonce, 42);
                assert_eq!(reply.data.len(), 1);
                assert_eq!(reply.data[0].1, b"hello".to_vec());
            }
            other => panic!("expected LookupReply, got {other:?}"),
        }
    }

    #[test]
    fn leave_refuses_while_store_is_nonempty() {
        let mut d = fresh();
        d.add_local(point("x", 1), b"a".to_vec());
        assert_eq!(d.leave(), Err(DispatchError::NonEmptyStore));
    }

    #[test]
    fn leave_with_no_neighbours_and_empty_store_succeeds_with_no_sends() {
        let mut d = fresh();
        let outbound = d.leave().unwrap();
        assert!(outbound.is_empty());
        let events = d.take_events();
        assert!(matches!(events.last(), Some(AppEvent::LeaveCompleted)));
    }

    #[test]
    fn joining_against_self_as_seed_is_dropped_silently() {
        let mut d = fresh();
        let me = d.node.self_ref.clone();
        let outbound = d.start_join(me);
        assert!(outbound.is_empty());
    }
}

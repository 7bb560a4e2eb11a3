// Integration tests live under tests/; see event_routing.rs and
// remote_endpoint.rs for the end-to-end scenarios from the spec.

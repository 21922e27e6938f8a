mod test_chat_fan_out;
mod test_ice_candidate_forwarding;
mod test_offer_to_disconnected_target;

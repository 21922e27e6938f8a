mod test_chat_reaches_room;
mod test_disconnect_closes_remote_links;

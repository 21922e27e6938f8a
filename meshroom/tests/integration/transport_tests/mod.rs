mod test_mesh_over_websocket;

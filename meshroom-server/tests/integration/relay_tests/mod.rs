mod test_sync_broadcast;

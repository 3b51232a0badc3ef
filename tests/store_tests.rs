use ipam::{DeviceInterface, IpamError, MemoryStore, RecordStore};
use std::thread::sleep;
use std::time::Duration;
use test_utils::{create_test_device, create_test_rack};


#[test]
fn test_insert_assigns_ids_and_cleans_interfaces() {
    let store = MemoryStore::new();
    let mut device = create_test_device(0, "edge01", "Online", &[" 10.1.1.5 ", ""]);
    device.interfaces.push(DeviceInterface {
        mac_address: Some(" 00:11:22:33:44:55 ".to_string()),
        ..DeviceInterface::new("10.1.1.6")
    });

    let id = store.insert_device(device).unwrap();
    let stored = store.device(id).unwrap();

    assert_eq!(id, 1);
    let addrs: Vec<&str> = stored.interfaces.iter().map(|i| i.ip_address.as_str()).collect();
    assert_eq!(addrs, vec!["10.1.1.5", "10.1.1.6"]);
    assert!(stored.interfaces.iter().all(|i| i.device_id == id && i.id > 0));
    assert_eq!(stored.interfaces[1].mac_address.as_deref(), Some("00:11:22:33:44:55"));
}

#[test]
fn test_devices_listed_most_recent_first() {
    let store = MemoryStore::new();
    let first = store.insert_device(create_test_device(0, "first", "Online", &[])).unwrap();
    sleep(Duration::from_millis(5));
    let second = store.insert_device(create_test_device(0, "second", "Online", &[])).unwrap();
    sleep(Duration::from_millis(5));

    let mut touched = store.device(first).unwrap();
    touched.description = "rebooted".to_string();
    store.update_device(touched).unwrap();

    let ids: Vec<i64> = store.all_devices().unwrap().iter().map(|d| d.id).collect();
    assert_eq!(ids, vec![first, second]);
}

#[test]
fn test_update_replaces_interfaces() {
    let store = MemoryStore::new();
    let id = store
        .insert_device(create_test_device(0, "db01", "Online", &["10.0.0.1", "10.0.0.2"]))
        .unwrap();

    let mut device = store.device(id).unwrap();
    device.interfaces = vec![DeviceInterface::new("10.0.0.9")];
    store.update_device(device).unwrap();

    let stored = store.device(id).unwrap();
    assert_eq!(stored.interfaces.len(), 1);
    assert_eq!(stored.interfaces[0].ip_address, "10.0.0.9");
}

#[test]
fn test_rack_name_is_resolved() {
    let store = MemoryStore::new();
    let rack_id = store.insert_rack(create_test_rack(0, "R-12")).unwrap();
    let mut device = create_test_device(0, "app01", "Online", &[]);
    device.rack_id = Some(rack_id);
    let id = store.insert_device(device).unwrap();

    assert_eq!(store.device(id).unwrap().rack_name, "R-12");
    assert_eq!(store.all_devices().unwrap()[0].rack_name, "R-12");
}

#[test]
fn test_racks_sorted_by_name_with_default_status() {
    let store = MemoryStore::new();
    store.insert_rack(create_test_rack(0, "C")).unwrap();
    store.insert_rack(create_test_rack(0, "A")).unwrap();
    let mut planned = create_test_rack(0, "B");
    planned.status = "Planned".to_string();
    store.insert_rack(planned).unwrap();

    let racks = store.all_racks().unwrap();
    let names: Vec<&str> = racks.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B", "C"]);
    assert_eq!(racks[0].status, "Online");
    assert_eq!(racks[1].status, "Planned");
}

#[test]
fn test_deleting_rack_unassigns_devices() {
    let store = MemoryStore::new();
    let rack_id = store.insert_rack(create_test_rack(0, "doomed")).unwrap();
    let mut device = create_test_device(0, "nas", "Online", &[]);
    device.rack_id = Some(rack_id);
    let id = store.insert_device(device).unwrap();

    store.delete_rack(rack_id).unwrap();

    let device = store.device(id).unwrap();
    assert_eq!(device.rack_id, None);
    assert!(device.rack_name.is_empty());
    assert!(store.all_racks().unwrap().is_empty());
}

#[test]
fn test_missing_records_are_not_found() {
    let store = MemoryStore::new();
    assert!(matches!(store.device(7), Err(IpamError::NotFound(_))));
    assert!(matches!(store.rack(7), Err(IpamError::NotFound(_))));
    assert!(matches!(store.delete_device(7), Err(IpamError::NotFound(_))));
    assert!(matches!(store.delete_rack(7), Err(IpamError::NotFound(_))));
    assert!(matches!(
        store.update_device(create_test_device(7, "ghost", "Online", &[])),
        Err(IpamError::NotFound(_))
    ));
    assert!(matches!(
        store.update_rack(create_test_rack(7, "ghost")),
        Err(IpamError::NotFound(_))
    ));
}

#[test]
fn test_delete_device_removes_it() {
    let store = MemoryStore::new();
    let id = store.insert_device(create_test_device(0, "tmp", "Online", &["10.0.0.3"])).unwrap();
    store.delete_device(id).unwrap();
    assert!(store.all_devices().unwrap().is_empty());
}

#[test]
fn test_snapshot_survives_save_and_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inventory.json");

    let store = MemoryStore::new();
    let rack_id = store.insert_rack(create_test_rack(0, "A-01")).unwrap();
    let mut device = create_test_device(0, "core", "Reserved", &["10.2.0.1"]);
    device.rack_id = Some(rack_id);
    store.insert_device(device).unwrap();
    store.save(&path).unwrap();

    let reopened = MemoryStore::open(&path).unwrap();
    let devices = reopened.all_devices().unwrap();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].hostname, "core");
    assert!(devices[0].status.is_reserved());
    assert_eq!(devices[0].rack_name, "A-01");
    assert_eq!(devices[0].interfaces[0].ip_address, "10.2.0.1");

    // ids continue after the loaded records
    let next = reopened.insert_device(create_test_device(0, "new", "Online", &[])).unwrap();
    assert_eq!(next, 2);
}

#[test]
fn test_missing_snapshot_opens_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryStore::open(dir.path().join("absent.json")).unwrap();
    assert!(store.all_devices().unwrap().is_empty());
    assert!(store.all_racks().unwrap().is_empty());
}

#[test]
fn test_corrupt_snapshot_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(matches!(MemoryStore::open(&path), Err(IpamError::Serialization(_))));
}

use crate::engine::Dashboard;
use crate::model::{Device, ScanReport, SlotStatus};
use crate::occupancy::OccupancyMap;
use crate::sort::{compare_addresses, merge_sort_by};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};

/// Slots shown per row of the address grid
const GRID_COLUMNS: usize = 16;

fn styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table
}

/// Aggregate counts of an occupancy map
pub fn summary_table(map: &OccupancyMap) -> Table {
    let mut table = styled_table();
    table.set_header(vec!["Subnet", "Total", "Used", "Reserved", "Free", "Usage"]);
    table.add_row(vec![
        Cell::new(format!("{}.0/24", map.subnet)).add_attribute(Attribute::Bold),
        Cell::new(map.total),
        Cell::new(map.used),
        Cell::new(map.reserved()),
        Cell::new(map.free),
        Cell::new(format!("{}%", map.usage_percent)),
    ]);
    table
}

/// Host octets laid out as a grid, coloured by status
pub fn address_grid(map: &OccupancyMap) -> Table {
    let mut table = styled_table();
    for row in map.slots.chunks(GRID_COLUMNS) {
        table.add_row(row.iter().map(|slot| {
            let cell = Cell::new(slot.octet);
            match slot.status {
                SlotStatus::Free => cell.fg(Color::Green),
                SlotStatus::Used => cell.fg(Color::Red),
                SlotStatus::Reserved => cell.fg(Color::Yellow),
            }
        }));
    }
    table
}

/// Devices of one group, one row per device
pub fn device_table(devices: &[Device]) -> Table {
    let mut table = styled_table();
    table.set_header(vec!["ID", "Hostname", "Type", "Status", "Addresses", "MAC"]);
    for device in devices {
        let addresses = device
            .interfaces
            .iter()
            .map(|i| match &i.label {
                Some(label) => format!("{} ({})", i.ip_address, label),
                None => i.ip_address.clone(),
            })
            .collect::<Vec<String>>()
            .join(", ");
        let macs = device
            .interfaces
            .iter()
            .filter_map(|i| i.mac_address.as_deref())
            .collect::<Vec<&str>>()
            .join(", ");
        table.add_row(vec![
            Cell::new(device.id),
            Cell::new(&device.hostname),
            Cell::new(&device.device_type),
            Cell::new(device.status.as_str()),
            Cell::new(if addresses.is_empty() { "—".to_string() } else { addresses }),
            Cell::new(if macs.is_empty() { "—".to_string() } else { macs }),
        ]);
    }
    table
}

/// Print the full dashboard to stdout
pub fn print_dashboard(dashboard: &Dashboard) {
    println!("{}", summary_table(&dashboard.map));
    println!("{}", address_grid(&dashboard.map));

    for group in &dashboard.groups.rack_groups {
        println!();
        println!(
            "Rack: {} ({}U, {}) {}",
            group.rack.name, group.rack.height, group.rack.status, group.rack.location
        );
        if group.devices.is_empty() {
            println!("  no devices");
        } else {
            println!("{}", device_table(&group.devices));
        }
    }

    if !dashboard.groups.unassigned.is_empty() {
        println!();
        println!("Unassigned devices");
        println!("{}", device_table(&dashboard.groups.unassigned));
    }
}

/// Responding addresses, sorted numerically for reading
pub fn scan_table(report: &ScanReport) -> Table {
    let mut addresses: Vec<&str> = report.active_ips.iter().map(String::as_str).collect();
    merge_sort_by(addresses.as_mut_slice(), &|a: &&str, b: &&str| compare_addresses(a, b));

    let mut table = styled_table();
    table.set_header(vec!["#", "Responding address"]);
    for (i, address) in addresses.iter().enumerate() {
        table.add_row(vec![Cell::new(i + 1), Cell::new(address)]);
    }
    table
}

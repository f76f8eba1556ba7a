// tests/integration_tests.rs
//
// End-to-end coverage of the public facade: parse -> validate -> match.

use disksel::{
    get_device_path, known_functions, known_variables, match_device, match_devices, parse,
    validate, Device, EvalError,
};

fn fleet() -> Vec<Device> {
    vec![
        Device {
            id: "nvme0n1".to_string(),
            device_id: "nvme-Samsung_970_EVO".to_string(),
            model: "Samsung 970 EVO".to_string(),
            size: 256 * 1024 * 1024 * 1024, // 256 GiB
            device_type: "nvme".to_string(),
            ..Default::default()
        },
        Device {
            id: "sda".to_string(),
            device_id: "scsi-SATA_WDC_WD10EZEX".to_string(),
            model: "WDC WD10EZEX".to_string(),
            size: 1024_u64.pow(4), // 1 TiB
            device_type: "sata".to_string(),
            ..Default::default()
        },
        Device {
            id: "sdb".to_string(),
            device_id: "scsi-SATA_Seagate_ST2000".to_string(),
            model: "Seagate ST2000DM008".to_string(),
            size: 2 * 1024_u64.pow(4), // 2 TiB
            device_type: "sata".to_string(),
            ..Default::default()
        },
    ]
}

// ============================================================================
// Parse + validate
// ============================================================================

#[test]
fn test_parse_and_validate_round() {
    let test_cases = vec![
        ("eq(@type, 'nvme')", true),
        ("unknown(@type)", false),
        ("eq(@nope, 'x')", false),
        ("and(eq(@type, 'nvme'), eq(@bad, 'test'))", false),
        (
            "and(or(not(eq(@type, 'nvme')), ne(@size, 100)), in(@vendor, 'a', 'b'), \
             re('pat', @model), gt(@size, 1), ge(@size, 1), lt(@size, 1), le(@size, 1))",
            true,
        ),
    ];

    for (input, expect_valid) in test_cases {
        let expr = parse(input).unwrap();
        let result = validate(&expr);
        assert_eq!(result.is_ok(), expect_valid, "Failed for input: {}", input);
    }
}

#[test]
fn test_validate_reports_unknown_function() {
    let expr = parse("unknown(@type)").unwrap();
    match validate(&expr).unwrap_err() {
        EvalError::UnknownFunction { name, pos } => {
            assert_eq!(name, "unknown");
            assert_eq!(pos.column, 1);
        }
        other => panic!("expected unknown function, got {:?}", other),
    }
}

#[test]
fn test_validate_reports_unknown_variable() {
    let expr = parse("eq(@nope, 'x')").unwrap();
    match validate(&expr).unwrap_err() {
        EvalError::UnknownVariable { name, .. } => assert_eq!(name, "@nope"),
        other => panic!("expected unknown variable, got {:?}", other),
    }
}

#[test]
fn test_validate_accepts_any_name_case() {
    // Same lookup as evaluation: case does not matter on either side
    let expr = parse("EQ(@TYPE, 'nvme')").unwrap();
    validate(&expr).unwrap();
}

#[test]
fn test_validation_does_not_require_a_device() {
    // Validation sees branches evaluation would skip
    let expr = parse("and(false, nosuch(@type))").unwrap();
    assert!(validate(&expr).is_err());
}

// ============================================================================
// match_device
// ============================================================================

#[test]
fn test_match_device_end_to_end() {
    let device = Device {
        id: "nvme0n1".to_string(),
        model: "Samsung 970 EVO Plus".to_string(),
        size: 256 * 1024 * 1024 * 1024, // 256 GiB
        device_type: "nvme".to_string(),
        ..Default::default()
    };

    let expr = parse(
        "and(eq(@type,'nvme'), ge(@size,100GiB), re('^/dev', @devnode), ne(@vendor,'Seagate'))",
    )
    .unwrap();
    validate(&expr).unwrap();

    assert!(match_device(&expr, &device, "stor-01").unwrap());
}

#[test]
fn test_match_device_host_restriction() {
    let device = fleet().remove(0);
    let expr = parse("and(eq(@type, 'nvme'), re('^stor-', @host))").unwrap();

    assert!(match_device(&expr, &device, "stor-01").unwrap());
    assert!(!match_device(&expr, &device, "db-01").unwrap());
}

#[test]
fn test_match_device_bare_boolean_rules() {
    let device = fleet().remove(0);
    assert!(match_device(&parse("true").unwrap(), &device, "h").unwrap());
    assert!(!match_device(&parse("false").unwrap(), &device, "h").unwrap());
}

// ============================================================================
// match_devices
// ============================================================================

#[test]
fn test_match_devices_counts() {
    let devices = fleet();

    let test_cases = vec![
        ("eq(@type, 'nvme')", 1),
        ("eq(@type, 'sata')", 2),
        ("or(eq(@type, 'nvme'), eq(@type, 'sata'))", 3),
        ("eq(@type, 'virtio')", 0),
        ("ge(@size, 1TiB)", 2),
        ("re('seagate', @vendor)", 1),
    ];

    for (input, expected_count) in test_cases {
        let expr = parse(input).unwrap();
        let matched = match_devices(&expr, &devices, "node-01").unwrap();
        assert_eq!(
            matched.len(),
            expected_count,
            "Failed for input: {}",
            input
        );
    }
}

#[test]
fn test_match_devices_preserves_input_order() {
    let devices = fleet();
    let expr = parse("or(eq(@type, 'nvme'), eq(@type, 'sata'))").unwrap();

    let matched = match_devices(&expr, &devices, "node-01").unwrap();
    let ids: Vec<&str> = matched.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["nvme0n1", "sda", "sdb"]);
}

#[test]
fn test_match_devices_aborts_on_first_error() {
    // A broken rule rejects the whole filter, it does not skip devices
    let devices = fleet();
    let expr = parse("eq(@nope, 'x')").unwrap();

    let err = match_devices(&expr, &devices, "node-01").unwrap_err();
    assert!(matches!(err, EvalError::UnknownVariable { .. }));
}

// ============================================================================
// get_device_path
// ============================================================================

#[test]
fn test_get_device_path_fallback_chain() {
    let test_cases = vec![
        (
            Device {
                id: "nvme0n1".to_string(),
                device_id: "nvme-X".to_string(),
                ..Default::default()
            },
            "/dev/disk/by-id/nvme-X",
        ),
        (
            Device {
                id: "vdc".to_string(),
                device_path: "pci-0000:00:1f.2".to_string(),
                ..Default::default()
            },
            "/dev/disk/by-path/pci-0000:00:1f.2",
        ),
        (
            Device {
                id: "vdc".to_string(),
                ..Default::default()
            },
            "/dev/vdc",
        ),
    ];

    for (device, expected) in test_cases {
        assert_eq!(get_device_path(&device), expected);
    }
}

#[test]
fn test_devnode_matches_derived_path() {
    // @devnode inside a rule sees the same path get_device_path reports
    let device = Device {
        id: "nvme0n1".to_string(),
        device_id: "nvme-X".to_string(),
        ..Default::default()
    };

    let expr = parse("eq(@devnode, '/dev/disk/by-id/nvme-X')").unwrap();
    assert!(match_device(&expr, &device, "h").unwrap());
    assert_eq!(get_device_path(&device), "/dev/disk/by-id/nvme-X");
}

// ============================================================================
// Allow-list introspection
// ============================================================================

#[test]
fn test_known_functions_and_variables() {
    let funcs = known_functions();
    for f in ["and", "or", "not", "in", "re", "eq", "ne", "gt", "ge", "lt", "le"] {
        assert!(funcs.contains(&f), "missing function {}", f);
    }
    assert_eq!(funcs.len(), 11);

    let vars = known_variables();
    for v in ["type", "vendor", "model", "size", "devnode", "host"] {
        assert!(vars.contains(&v), "missing variable {}", v);
    }
    assert_eq!(vars.len(), 6);
}

// ============================================================================
// Reuse across evaluations
// ============================================================================

#[test]
fn test_parsed_rule_is_reusable() {
    // One tree, many devices, many hosts: nothing in the AST mutates
    let expr = parse("eq(@type, 'sata')").unwrap();
    let devices = fleet();

    for _ in 0..3 {
        let matched = match_devices(&expr, &devices, "node-01").unwrap();
        assert_eq!(matched.len(), 2);
        assert!(match_device(&expr, &devices[1], "other-host").unwrap());
    }
}

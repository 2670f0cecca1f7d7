//! End-to-end addon lifecycle against a temporary directory tree.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;

use addonenv::{Addon, Environment, LinkState};

struct RecordingEnv {
    addons_path: PathBuf,
    calls: RefCell<Vec<(String, Vec<String>)>>,
}

impl Environment for RecordingEnv {
    fn addon_source_path(&self) -> &Path {
        &self.addons_path
    }

    fn execute(&self, command: &str, args: &[String]) {
        self.calls
            .borrow_mut()
            .push((command.to_string(), args.to_vec()));
    }
}

/// Lays out a realistic addon checkout next to an empty addons directory.
fn fixture() -> (tempfile::TempDir, Addon, RecordingEnv) {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().canonicalize().unwrap();

    let source = base.join("available/sale_extra");
    fs::create_dir_all(source.join("models")).unwrap();
    fs::create_dir_all(source.join("views")).unwrap();

    fs::write(
        source.join("__openerp__.py"),
        concat!(
            "{\n",
            "    'name': 'Sale Extra',\n",
            "    'description': \"\"\"Extra fields for sales.\"\"\",\n",
            "    'depends': ['sale', 'base'],\n",
            "    'version': '1.0',\n",
            "    'external_dependencies': {'python': ['lxml', 'requests']},\n",
            "}\n",
        ),
    )
    .unwrap();

    fs::write(
        source.join("models/partner.py"),
        concat!(
            "class PartnerExtra(object):\n",
            "    _name = \"res.partner.extra\"\n",
            "    _columns = {\n",
            "        'nickname': 'char',\n",
            "    }\n",
            "\n",
            "class Partner(object):\n",
            "    _inherit = \"res.partner\"\n",
        ),
    )
    .unwrap();

    fs::write(
        source.join("views/partner_view.xml"),
        "<record id=\"view_partner_extra\" model=\"ir.ui.view\"/>\n",
    )
    .unwrap();
    fs::write(
        source.join("views/partner_search.xml"),
        "<record id=\"view_partner_extra\"/>\n<record id=\"action_partner_extra\"/>\n",
    )
    .unwrap();

    let addons_path = base.join("addons");
    fs::create_dir_all(&addons_path).unwrap();

    let addon = Addon::new(source.join("__openerp__.py")).unwrap();
    let env = RecordingEnv {
        addons_path,
        calls: RefCell::new(Vec::new()),
    };
    (dir, addon, env)
}

#[test]
fn manifest_then_introspection_then_activation() {
    let (_dir, addon, env) = fixture();

    // Manifest.
    assert_eq!(addon.token(), "sale_extra");
    assert_eq!(addon.name().unwrap(), "Sale Extra");
    assert_eq!(addon.depends().unwrap(), vec!["sale", "base"]);
    assert_eq!(addon.description().unwrap(), "Extra fields for sales.");
    assert_eq!(addon.website().unwrap(), None);

    // Introspection.
    let (declared, inherited) = addon.models().unwrap();
    assert_eq!(declared, BTreeSet::from(["res.partner.extra".to_string()]));
    assert_eq!(inherited, BTreeSet::from(["res.partner".to_string()]));

    let ids = addon.record_ids().unwrap();
    assert!(ids.contains("view_partner_extra"));
    assert!(ids.contains("action_partner_extra"));
    assert_eq!(ids.len(), 2);

    let locations = addon.record_locations("view_partner_extra").unwrap();
    assert_eq!(locations.len(), 2);

    let fields = addon.fields().unwrap();
    assert_eq!(fields.len(), 1);
    let field = fields.iter().next().unwrap();
    assert_eq!(field.model.as_deref(), Some("res.partner.extra"));
    assert_eq!(field.field, "nickname");

    // Activation round trip.
    assert_eq!(addon.link_state(&env), LinkState::Unlinked);
    assert!(addon.enable(&env, false).unwrap());
    assert_eq!(addon.link_state(&env), LinkState::LinkedValid);
    assert!(!addon.enable(&env, false).unwrap());

    assert!(addon.disable(&env, false).unwrap());
    assert_eq!(addon.link_state(&env), LinkState::Unlinked);
    assert!(addon.is_saned(&env));

    // External dependencies fire once per module, in manifest order.
    addon.install_external_dependencies(&env).unwrap();
    let calls = env.calls.borrow();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].1, vec!["install".to_string(), "lxml".to_string()]);
    assert_eq!(
        calls[1].1,
        vec!["install".to_string(), "requests".to_string()]
    );
}

#[test]
fn broken_link_recovery() {
    let (_dir, addon, env) = fixture();

    addon.enable(&env, false).unwrap();
    fs::remove_dir_all(addon.source_dir().join("views")).unwrap();
    assert!(addon.is_enabled(&env));

    // Deleting the whole source tree leaves a dangling link behind.
    fs::remove_dir_all(addon.source_dir()).unwrap();
    assert_eq!(addon.link_state(&env), LinkState::Dangling);
    assert!(!addon.is_saned(&env));

    // Recreate the source and repair with force.
    fs::create_dir_all(addon.source_dir()).unwrap();
    assert!(addon.enable(&env, true).unwrap());
    assert_eq!(addon.link_state(&env), LinkState::LinkedValid);
}

//! Deploy and exercise the Magni V2 vault on a live Casper network.
//!
//! The mode comes from `MAGNI_LIVENET_MODE`:
//! - `deploy`           deploy mCSPR + vault, wire the minter, print a deploy JSON line
//! - `deploy_and_demo`  deploy, then run the deposit/borrow/withdraw demo
//! - `demo`             run the demo against existing contracts
//! - `finalize`         finalize a pending withdrawal after unbonding
//! - `query`            print the caller's position as a JSON line
//!
//! Modes that reuse contracts read `MAGNI_EXISTING_MCSPR` and
//! `MAGNI_EXISTING_MAGNI` (64-hex, or "hash-..."/"contract-package-..."
//! formatted). The Odra livenet backend is configured through the usual
//! `ODRA_CASPER_LIVENET_*` variables (secret key path, node address,
//! events URL, chain name).
//!
//! Tunables, all optional:
//! - `DEFAULT_VALIDATOR_PUBLIC_KEY`       validator hex key (01/02 prefixed)
//! - `ODRA_CASPER_LIVENET_DEPLOY_GAS_TOKEN` / `..._DEPLOY_GAS_MAGNI` /
//!   `..._CALL_GAS` / `..._GAS`           gas budgets in motes
//! - `MAGNI_DEMO_DEPOSIT_CSPR`            demo deposit (default 100)
//! - `MAGNI_DEMO_BORROW_CSPR`             demo borrow (default 50)
//! - `MAGNI_DEMO_REQUEST_WITHDRAW`        0 to skip the withdraw leg (default 1)

use odra::host::{Deployer, HostEnv, HostRef, HostRefLoader};
use odra::prelude::*;
use odra::casper_types::{U256, U512};

use magni_vault::math::{MOTES_PER_CSPR, WAD};
use magni_vault::tokens::{MCSPRToken, MCSPRTokenHostRef, MCSPRTokenInitArgs};
use magni_vault::vault::{Magni, MagniHostRef, MagniInitArgs};

const FALLBACK_VALIDATOR_KEY: &str =
    "012b365e09c5d75187b4abc25c4aa28109133bab6a256ef4abe24348073e590d80";

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    Deploy,
    DeployAndDemo,
    Demo,
    Finalize,
    Query,
}

impl Mode {
    fn from_env() -> Mode {
        let raw = std::env::var("MAGNI_LIVENET_MODE").unwrap_or_else(|_| "deploy".to_string());
        match raw.as_str() {
            "deploy" => Mode::Deploy,
            "deploy_and_demo" => Mode::DeployAndDemo,
            "demo" => Mode::Demo,
            "finalize" => Mode::Finalize,
            "query" => Mode::Query,
            other => panic!("unknown MAGNI_LIVENET_MODE: {other}"),
        }
    }

    fn deploys(self) -> bool {
        matches!(self, Mode::Deploy | Mode::DeployAndDemo)
    }
}

struct Config {
    deploy_gas_token: u64,
    deploy_gas_vault: u64,
    call_gas: u64,
    validator_key: String,
    deposit_motes: U512,
    borrow_wad: U256,
    with_withdraw: bool,
}

impl Config {
    fn from_env() -> Config {
        let gas_fallback = env_u64("ODRA_CASPER_LIVENET_GAS", 450_000_000_000);
        let deposit_cspr = env_u64("MAGNI_DEMO_DEPOSIT_CSPR", 100);
        let borrow_cspr = env_u64("MAGNI_DEMO_BORROW_CSPR", 50);
        Config {
            deploy_gas_token: env_u64("ODRA_CASPER_LIVENET_DEPLOY_GAS_TOKEN", gas_fallback),
            deploy_gas_vault: env_u64("ODRA_CASPER_LIVENET_DEPLOY_GAS_MAGNI", 600_000_000_000),
            call_gas: env_u64("ODRA_CASPER_LIVENET_CALL_GAS", 50_000_000_000),
            validator_key: std::env::var("DEFAULT_VALIDATOR_PUBLIC_KEY")
                .unwrap_or_else(|_| FALLBACK_VALIDATOR_KEY.to_string()),
            deposit_motes: U512::from(deposit_cspr) * U512::from(MOTES_PER_CSPR),
            borrow_wad: U256::from(borrow_cspr) * U256::from(WAD),
            with_withdraw: env_u64("MAGNI_DEMO_REQUEST_WITHDRAW", 1) != 0,
        }
    }
}

fn main() {
    let env = odra_casper_livenet_env::env();
    let mode = Mode::from_env();
    let cfg = Config::from_env();
    let caller = env.caller();

    println!("magni_livenet: mode={mode:?} caller={caller:?}");
    println!(
        "magni_livenet: gas(token={} vault={} call={}) validator={}",
        cfg.deploy_gas_token, cfg.deploy_gas_vault, cfg.call_gas, cfg.validator_key
    );

    let mut mcspr = if mode.deploys() {
        println!("deploying mCSPR...");
        env.set_gas(cfg.deploy_gas_token);
        let token = MCSPRToken::deploy(&env, MCSPRTokenInitArgs { minter: caller });
        println!("  mCSPR at {:?} ({} / {})", token.address(), token.symbol(), token.name());
        token
    } else {
        let addr = parse_contract_address(&required_env("MAGNI_EXISTING_MCSPR"));
        println!("using existing mCSPR at {addr:?}");
        MCSPRToken::load(&env, addr)
    };

    let mut magni = if mode.deploys() {
        println!("deploying Magni vault...");
        env.set_gas(cfg.deploy_gas_vault);
        let vault = Magni::deploy(
            &env,
            MagniInitArgs {
                debt_token: mcspr.address(),
                validator_public_key: cfg.validator_key.clone(),
            },
        );
        println!("  vault at {:?}", vault.address());
        vault
    } else {
        let addr = parse_contract_address(&required_env("MAGNI_EXISTING_MAGNI"));
        println!("using existing vault at {addr:?}");
        Magni::load(&env, addr)
    };

    if mode != Mode::Query {
        ensure_minter(&env, &mut mcspr, magni.address(), cfg.call_gas);
    }

    match mode {
        Mode::Deploy => {}
        Mode::DeployAndDemo | Mode::Demo => run_demo(&env, &mut magni, &mcspr, &cfg),
        Mode::Finalize => run_finalize(&env, &mut magni, &mcspr, cfg.call_gas),
        Mode::Query => {
            print_position_json(&magni, &mcspr, caller);
            return;
        }
    }

    print_deploy_json(mcspr.address(), magni.address(), &cfg.validator_key);
}

/// Borrowing only works once the vault holds the mint/burn role.
fn ensure_minter(env: &HostEnv, mcspr: &mut MCSPRTokenHostRef, vault: Address, gas: u64) {
    let current = mcspr.minter();
    let already_vault = current.map_or(false, |m| {
        m == vault || m.as_contract_package_hash() == vault.as_contract_package_hash()
    });
    if already_vault {
        println!("mCSPR minter already points at the vault");
        return;
    }
    println!("handing mCSPR minter to the vault (was {current:?})...");
    env.set_gas(gas);
    mcspr.set_minter(vault);
    let updated = mcspr.minter();
    assert!(updated.is_some(), "set_minter left the minter unset");
    println!("  minter is now {updated:?}");
}

fn run_demo(env: &HostEnv, magni: &mut MagniHostRef, mcspr: &MCSPRTokenHostRef, cfg: &Config) {
    let caller = env.caller();

    println!("demo: depositing {} motes...", cfg.deposit_motes);
    env.set_gas(cfg.call_gas);
    magni.with_tokens(cfg.deposit_motes).deposit();
    print_position(magni, mcspr, caller);

    println!("demo: borrowing {} wad...", cfg.borrow_wad);
    env.set_gas(cfg.call_gas);
    magni.borrow(cfg.borrow_wad);
    print_position(magni, mcspr, caller);

    if !cfg.with_withdraw {
        return;
    }

    // Take out half of what the LTV cap leaves withdrawable
    let withdraw_motes = magni.max_withdraw_of(caller) / 2;
    if withdraw_motes == U512::zero() {
        println!("demo: skipping withdraw, nothing withdrawable under the LTV cap");
        return;
    }

    println!("demo: requesting withdrawal of {withdraw_motes} motes...");
    env.set_gas(cfg.call_gas);
    magni.request_withdraw(withdraw_motes);
    print_position(magni, mcspr, caller);
    if magni.status_of(caller) == 2 {
        println!("demo: withdrawal is unbonding; rerun with MAGNI_LIVENET_MODE=finalize in ~14h");
    }
}

fn run_finalize(env: &HostEnv, magni: &mut MagniHostRef, mcspr: &MCSPRTokenHostRef, gas: u64) {
    let caller = env.caller();
    if magni.status_of(caller) != 2 {
        println!("nothing to finalize: caller is not in the Withdrawing state");
        return;
    }
    println!("finalizing withdrawal...");
    env.set_gas(gas);
    magni.finalize_withdraw();
    print_position(magni, mcspr, caller);
}

fn print_position(magni: &MagniHostRef, mcspr: &MCSPRTokenHostRef, user: Address) {
    let pos = magni.get_position(user);
    let status = match pos.status {
        0 => "None",
        1 => "Active",
        2 => "Withdrawing",
        _ => "?",
    };
    println!("  position: status={status} collateral={} motes debt={} wad", pos.collateral_motes, pos.debt_wad);
    println!(
        "            ltv={} bps health={} pending_withdraw={} motes mcspr_balance={}",
        pos.ltv_bps,
        pos.health_factor,
        pos.pending_withdraw_motes,
        mcspr.balance_of(user)
    );
    println!(
        "  vault:    collateral={} debt={} pending_to_delegate={} delegated={} liquid={}",
        magni.total_collateral(),
        magni.total_debt_principal(),
        magni.pending_to_delegate(),
        magni.total_delegated(),
        magni.liquid_balance()
    );
}

fn print_position_json(magni: &MagniHostRef, mcspr: &MCSPRTokenHostRef, user: Address) {
    let pos = magni.get_position(user);
    let fields = [
        format!(r#""collateral_motes":"{}""#, pos.collateral_motes),
        format!(r#""collateral_wad":"{}""#, pos.collateral_wad),
        format!(r#""debt_wad":"{}""#, pos.debt_wad),
        format!(r#""ltv_bps":{}"#, pos.ltv_bps),
        format!(r#""health_factor":{}"#, pos.health_factor),
        format!(r#""pending_withdraw_motes":"{}""#, pos.pending_withdraw_motes),
        format!(r#""status":{}"#, pos.status),
        format!(r#""mcspr_balance":"{}""#, mcspr.balance_of(user)),
        format!(r#""user":"{user:?}""#),
    ];
    println!("MAGNI_POSITION_JSON={{{}}}", fields.join(","));
}

fn print_deploy_json(mcspr: Address, magni: Address, validator_key: &str) {
    let chain_name = std::env::var("ODRA_CASPER_LIVENET_CHAIN_NAME")
        .unwrap_or_else(|_| "casper-test".to_string());
    let node_url = std::env::var("ODRA_CASPER_LIVENET_NODE_ADDRESS")
        .unwrap_or_else(|_| "https://node.testnet.casper.network".to_string());
    let fields = [
        format!(r#""chain_name":"{chain_name}""#),
        format!(r#""node_url":"{node_url}""#),
        format!(r#""mcspr_contract_hash":"{}""#, address_hex(&mcspr)),
        format!(r#""magni_contract_hash":"{}""#, address_hex(&magni)),
        format!(r#""validator_public_key":"{validator_key}""#),
        format!(r#""deployed_at":"{}""#, chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ")),
    ];
    println!("MAGNI_DEPLOY_JSON={{{}}}", fields.join(","));
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|raw| raw.trim().replace('_', "").parse().ok())
        .unwrap_or(default)
}

fn required_env(name: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| panic!("{name} must be set for this mode"))
}

/// Render an address as bare hex. Odra's `Address` debug form prints the
/// raw bytes as `0x..` pairs; collect them back into one hex string.
fn address_hex(addr: &Address) -> String {
    let debug = format!("{addr:?}");
    debug
        .split("0x")
        .skip(1)
        .map(|chunk| {
            chunk
                .chars()
                .take_while(|c| c.is_ascii_hexdigit())
                .collect::<String>()
        })
        .collect()
}

fn parse_contract_address(raw: &str) -> Address {
    use odra::casper_types::account::AccountHash;
    use odra::casper_types::contracts::ContractPackageHash;

    let value = raw.trim();
    let (prefix, hex) = ["account-hash-", "contract-package-", "package-", "hash-"]
        .iter()
        .find_map(|p| value.strip_prefix(p).map(|rest| (*p, rest)))
        .unwrap_or(("", value));

    let hash = decode_hash_hex(hex);
    if prefix == "account-hash-" {
        Address::Account(AccountHash::new(hash))
    } else {
        Address::Contract(ContractPackageHash::new(hash))
    }
}

fn decode_hash_hex(hex: &str) -> [u8; 32] {
    assert!(
        hex.len() == 64 && hex.chars().all(|c| c.is_ascii_hexdigit()),
        "expected a 64-char hex hash, got {hex:?}"
    );
    let mut out = [0u8; 32];
    for (slot, pair) in out.iter_mut().zip(hex.as_bytes().chunks(2)) {
        let pair = std::str::from_utf8(pair).expect("hex is ascii");
        *slot = u8::from_str_radix(pair, 16).expect("checked hex digit");
    }
    out
}

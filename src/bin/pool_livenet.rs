//! Livenet deploy and demo binary for the fixed-term staking pool.
//!
//! Run with:
//! - Deploy only:        POOL_LIVENET_MODE=deploy cargo run --bin pool_livenet --features=livenet
//! - Deploy + demo:      POOL_LIVENET_MODE=deploy_and_demo cargo run --bin pool_livenet --features=livenet
//! - Stake on existing:  POOL_LIVENET_MODE=demo POOL_EXISTING_POOL=... cargo run ...
//! - Accrue one day:     POOL_LIVENET_MODE=calculate POOL_EXISTING_POOL=... cargo run ...
//! - Withdraw all:       POOL_LIVENET_MODE=withdraw POOL_EXISTING_POOL=... cargo run ...
//! - Query position:     POOL_LIVENET_MODE=query POOL_EXISTING_POOL=... cargo run ...
//!
//! Required environment variables (Odra livenet):
//! - ODRA_CASPER_LIVENET_SECRET_KEY_PATH
//! - ODRA_CASPER_LIVENET_NODE_ADDRESS
//! - ODRA_CASPER_LIVENET_EVENTS_URL
//! - ODRA_CASPER_LIVENET_CHAIN_NAME
//!
//! Optional:
//! - POOL_STAKE_KIND                       ("native" or "token"; default: native; deploy modes only)
//! - POOL_WITHDRAWAL_POLICY                ("locked" or "immediate"; default: locked; deploy modes only)
//! - POOL_INTEREST_TOKENS                  (whole interest tokens to fund; default: 300)
//! - POOL_STAKING_DAYS                     (default: 3)
//! - POOL_START_DELAY_MS                   (start = now + delay; default: 60000)
//! - POOL_DURATION_MS                      (end = start + duration; default: 3 days)
//! - POOL_DEMO_STAKE                       (whole CSPR or stake tokens; default: 10)
//! - POOL_EXISTING_POOL                    (64-hex or formatted "hash-..."/"contract-package-...")
//! - POOL_EXISTING_INTEREST_TOKEN          (fallback when the pool does not report one)
//! - POOL_EXISTING_STAKE_TOKEN             (fallback when the pool does not report one)
//! - ODRA_CASPER_LIVENET_DEPLOY_GAS_TOKEN  (motes)
//! - ODRA_CASPER_LIVENET_DEPLOY_GAS_POOL   (motes)
//! - ODRA_CASPER_LIVENET_CALL_GAS          (motes)

use odra::casper_types::{U256, U512};
use odra::host::{Deployer, HostEnv, HostRef, HostRefLoader};
use odra::prelude::*;

use term_pool_casper::asset::{motes_to_amount, StakeAssetKind};
use term_pool_casper::gate::WithdrawalPolicy;
use term_pool_casper::pool::{StakingPool, StakingPoolHostRef, StakingPoolInitArgs};
use term_pool_casper::tokens::{FungibleToken, FungibleTokenHostRef, FungibleTokenInitArgs};

const MOTES_PER_CSPR: u64 = 1_000_000_000;
const TOKEN_DECIMALS: u8 = 18;
const DAY_MS: u64 = 86_400_000;

const DEFAULT_DEPLOY_GAS_TOKEN_MOTES: u64 = 450_000_000_000; // 450 CSPR
const DEFAULT_DEPLOY_GAS_POOL_MOTES: u64 = 600_000_000_000; // 600 CSPR
const DEFAULT_CALL_GAS_MOTES: u64 = 50_000_000_000; // 50 CSPR

/// Whole tokens to base units (18 decimals)
fn tokens_to_units(tokens: u64) -> U256 {
    U256::from(tokens) * U256::exp10(TOKEN_DECIMALS as usize)
}

fn main() {
    println!("============================================");
    println!("  Fixed-Term Staking Pool - Livenet");
    println!("============================================\n");

    let env = odra_casper_livenet_env::env();

    let mode = std::env::var("POOL_LIVENET_MODE").unwrap_or_else(|_| "deploy".to_string());
    let should_deploy = mode == "deploy" || mode == "deploy_and_demo";
    let should_demo = mode == "demo" || mode == "deploy_and_demo";

    let deploy_gas_token = read_u64_env("ODRA_CASPER_LIVENET_DEPLOY_GAS_TOKEN", DEFAULT_DEPLOY_GAS_TOKEN_MOTES);
    let deploy_gas_pool = read_u64_env("ODRA_CASPER_LIVENET_DEPLOY_GAS_POOL", DEFAULT_DEPLOY_GAS_POOL_MOTES);
    let call_gas = read_u64_env("ODRA_CASPER_LIVENET_CALL_GAS", DEFAULT_CALL_GAS_MOTES);

    // An existing pool carries its own asset configuration
    let existing_pool = if should_deploy {
        None
    } else {
        let addr = required_address("POOL_EXISTING_POOL", &mode);
        Some(StakingPool::load(&env, addr))
    };

    let stake_kind = match &existing_pool {
        Some(pool) => pool.stake_asset_kind(),
        None => match read_string_env("POOL_STAKE_KIND", "native").as_str() {
            "token" => StakeAssetKind::Token,
            _ => StakeAssetKind::Native,
        },
    };
    let policy = match &existing_pool {
        Some(pool) => pool.withdrawal_policy(),
        None => match read_string_env("POOL_WITHDRAWAL_POLICY", "locked").as_str() {
            "immediate" => WithdrawalPolicy::Immediate,
            _ => WithdrawalPolicy::Locked,
        },
    };
    let interest_tokens = read_u64_env("POOL_INTEREST_TOKENS", 300);
    let staking_days = u32::try_from(read_u64_env("POOL_STAKING_DAYS", 3)).unwrap_or(3);
    let start_delay_ms = read_u64_env("POOL_START_DELAY_MS", 60_000);
    let duration_ms = read_u64_env("POOL_DURATION_MS", 3 * DAY_MS);
    let demo_stake = read_u64_env("POOL_DEMO_STAKE", 10);

    println!("[INFO] Mode: {}", mode);
    println!("[INFO] Caller: {:?}", env.caller());
    println!(
        "[INFO] Gas (motes): deploy_token={} ({} CSPR), deploy_pool={} ({} CSPR), calls={} ({} CSPR)",
        deploy_gas_token,
        deploy_gas_token / MOTES_PER_CSPR,
        deploy_gas_pool,
        deploy_gas_pool / MOTES_PER_CSPR,
        call_gas,
        call_gas / MOTES_PER_CSPR
    );
    println!(
        "[INFO] Pool params: stake={:?}, policy={:?}, interest={} tokens, days={}, start_delay={}ms, duration={}ms",
        stake_kind, policy, interest_tokens, staking_days, start_delay_ms, duration_ms
    );
    println!();

    // ==========================================
    // Step 1: Deploy (or reuse) the interest token
    // ==========================================
    let mut interest_token = if should_deploy {
        println!("[STEP 1] Deploying interest token...");
        env.set_gas(deploy_gas_token);
        let token = FungibleToken::deploy(
            &env,
            FungibleTokenInitArgs {
                symbol: "INT".to_string(),
                name: "Pool Interest".to_string(),
                decimals: TOKEN_DECIMALS,
                initial_supply: tokens_to_units(interest_tokens),
            },
        );
        println!("[OK] Interest token deployed at: {:?}", token.address());
        println!();
        token
    } else {
        println!("[STEP 1] Reusing existing interest token...");
        let addr = existing_pool
            .as_ref()
            .and_then(|pool| pool.interest_token())
            .unwrap_or_else(|| required_address("POOL_EXISTING_INTEREST_TOKEN", &mode));
        println!("[OK] Interest token: {:?}", addr);
        println!();
        FungibleToken::load(&env, addr)
    };

    // ==========================================
    // Step 2: Stake token, if the pool takes one
    // ==========================================
    let mut stake_token = match stake_kind {
        StakeAssetKind::Native => None,
        StakeAssetKind::Token if should_deploy => {
            println!("[STEP 2] Deploying stake token...");
            env.set_gas(deploy_gas_token);
            let token = FungibleToken::deploy(
                &env,
                FungibleTokenInitArgs {
                    symbol: "STK".to_string(),
                    name: "Pool Stake".to_string(),
                    decimals: TOKEN_DECIMALS,
                    initial_supply: tokens_to_units(demo_stake * 100),
                },
            );
            println!("[OK] Stake token deployed at: {:?}", token.address());
            println!();
            Some(token)
        }
        StakeAssetKind::Token => {
            let addr = existing_pool
                .as_ref()
                .and_then(|pool| pool.stake_token())
                .unwrap_or_else(|| required_address("POOL_EXISTING_STAKE_TOKEN", &mode));
            println!("[STEP 2] Reusing stake token: {:?}", addr);
            println!();
            Some(FungibleToken::load(&env, addr))
        }
    };

    // ==========================================
    // Step 3: Deploy and initialize (or reuse) the pool
    // ==========================================
    let mut pool = if let Some(pool) = existing_pool {
        println!("[STEP 3] Reusing pool: {:?}", pool.address());
        println!();
        pool
    } else {
        println!("[STEP 3] Deploying staking pool...");
        env.set_gas(deploy_gas_pool);
        let (stake_token_addr, stake_symbol) = match &stake_token {
            Some(token) => (Some(token.address()), token.symbol()),
            None => (None, "CSPR".to_string()),
        };
        let mut pool = StakingPool::deploy(
            &env,
            StakingPoolInitArgs {
                stake_asset_kind: stake_kind,
                stake_token: stake_token_addr,
                stake_symbol,
                interest_token: interest_token.address(),
                interest_symbol: interest_token.symbol(),
                withdrawal_policy: policy,
            },
        );
        println!("[OK] Pool deployed at: {:?}", pool.address());

        let start = chrono::Utc::now().timestamp_millis() as u64 + start_delay_ms;
        let end = start + duration_ms;
        let budget = tokens_to_units(interest_tokens);

        println!("[STEP 3b] Funding {} interest tokens, start={}, end={}...", interest_tokens, start, end);
        env.set_gas(call_gas);
        interest_token.approve(pool.address(), budget);
        pool.initialize(budget, start, end, staking_days);
        println!("[OK] Pool initialized. Day duration: {} ms", pool.day_duration());
        println!();
        pool
    };

    // ==========================================
    // Operations
    // ==========================================
    let caller = env.caller();

    if should_demo {
        println!("[DEMO] Staking {} ...", demo_stake);
        env.set_gas(call_gas);
        match stake_token.as_mut() {
            None => {
                let motes = U512::from(demo_stake) * U512::from(MOTES_PER_CSPR);
                let amount = motes_to_amount(motes).unwrap_or_default();
                report("stake", pool.with_tokens(motes).try_stake(amount));
            }
            Some(token) => {
                let amount = tokens_to_units(demo_stake);
                token.approve(pool.address(), amount);
                report("stake", pool.try_stake(amount));
            }
        }
        print_position(&pool, caller);
    }

    if mode == "calculate" {
        println!("[OP] Accruing day {} of {}...", pool.current_day() + 1, pool.staking_days());
        env.set_gas(call_gas);
        report("calculate", pool.try_calculate());
        print_position(&pool, caller);
    }

    if mode == "withdraw" {
        if !pool.can_withdraw() {
            println!("[SKIP] Withdrawals are locked (day {} of {}).", pool.current_day(), pool.staking_days());
        } else {
            env.set_gas(call_gas);
            let principal = pool.balance_of(caller);
            if !principal.is_zero() {
                report("principal_withdraw", pool.try_principal_withdraw(principal));
            }
            let interest = pool.interest_of(caller);
            if !interest.is_zero() {
                report("interest_withdraw", pool.try_interest_withdraw(interest));
            }
            print_position(&pool, caller);
        }
    }

    if mode == "query" {
        let pos = pool.position_of(caller);
        let info = pool.pool_info();
        println!(
            "POOL_POSITION_JSON={{\"balance\":\"{}\",\"interest\":\"{}\",\"interest_credited\":\"{}\",\"interest_withdrawn\":\"{}\",\"current_day\":{},\"staking_days\":{},\"stake_total\":\"{}\",\"interest_rest\":\"{}\",\"user\":\"{:?}\"}}",
            pos.balance,
            pos.interest_accrued,
            pos.interest_credited,
            pos.interest_withdrawn,
            info.current_day,
            info.staking_days,
            info.stake_total,
            info.interest_rest,
            caller
        );
        return;
    }

    output_deploy_json(&env, interest_token.address(), pool.address());
}

fn report<T, E: core::fmt::Debug>(op: &str, result: Result<T, E>) {
    match result {
        Ok(_) => println!("[OK] {} applied.", op),
        Err(err) => println!("[FAIL] {} reverted: {:?}", op, err),
    }
}

fn print_position(pool: &StakingPoolHostRef, user: Address) {
    let pos = pool.position_of(user);
    let info = pool.pool_info();
    println!("     balance: {}", pos.balance);
    println!("     interest (withdrawable): {}", pos.interest_accrued);
    println!("     interest credited: {}", pos.interest_credited);
    println!("     interest withdrawn: {}", pos.interest_withdrawn);
    println!("     day: {} / {}", info.current_day, info.staking_days);
    println!("     stake_total: {}", info.stake_total);
    println!("     interest_rest: {} of {}", info.interest_rest, info.interest_total);
    println!("     dust: {}", pool.undistributed_dust());
    println!("     can_withdraw: {}", pool.can_withdraw());
    println!();
}

fn read_u64_env(name: &str, default_value: u64) -> u64 {
    match std::env::var(name) {
        Ok(raw) => {
            let cleaned = raw.trim().replace('_', "");
            cleaned.parse::<u64>().unwrap_or(default_value)
        }
        Err(_) => default_value,
    }
}

fn read_string_env(name: &str, default_value: &str) -> String {
    std::env::var(name)
        .map(|v| v.trim().to_lowercase())
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default_value.to_string())
}

fn required_address(name: &str, mode: &str) -> Address {
    let raw = std::env::var(name)
        .unwrap_or_else(|_| panic!("{} must be set for mode={}", name, mode));
    parse_contract_address(&raw)
}

fn output_deploy_json(env: &HostEnv, interest_token: Address, pool: Address) {
    let chain_name =
        std::env::var("ODRA_CASPER_LIVENET_CHAIN_NAME").unwrap_or_else(|_| "casper-test".to_string());

    println!(
        r#"POOL_DEPLOY_JSON={{"chain_name":"{}","operator":"{:?}","interest_token_hash":"{}","pool_contract_hash":"{}","deployed_at":"{}"}}"#,
        chain_name,
        env.caller(),
        format_address_hash(&interest_token),
        format_address_hash(&pool),
        chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ")
    );
}

/// Hex of the hash inside an address' debug form
fn format_address_hash(addr: &Address) -> String {
    let debug_str = format!("{:?}", addr);
    let (Some(start), Some(end)) = (debug_str.find('['), debug_str.rfind(']')) else {
        return debug_str;
    };
    debug_str[start + 1..end]
        .split(", ")
        .filter_map(|part| part.strip_prefix("0x").or_else(|| part.strip_prefix("0X")))
        .collect()
}

fn parse_contract_address(raw: &str) -> Address {
    use odra::casper_types::account::AccountHash;
    use odra::casper_types::contracts::ContractPackageHash;

    fn decode_hex_32(s: &str) -> [u8; 32] {
        if s.len() != 64 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            panic!("Invalid address hash (expected 64 hex): {}", s);
        }
        let mut out = [0u8; 32];
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16)
                .unwrap_or_else(|_| panic!("Invalid hex in address: {}", s));
        }
        out
    }

    let trimmed = raw.trim();
    if let Some(hex) = trimmed.strip_prefix("account-hash-") {
        return Address::Account(AccountHash::new(decode_hex_32(hex)));
    }
    let package_hex = ["contract-package-", "package-", "hash-"]
        .iter()
        .find_map(|prefix| trimmed.strip_prefix(prefix))
        .unwrap_or(trimmed);
    Address::Contract(ContractPackageHash::new(decode_hex_32(package_hex)))
}

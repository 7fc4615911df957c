//! End-to-end dispatch through both adapters against recording chain
//! doubles.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chain_eth::{abi, mailer as evm_mailer};
use chain_sol::mailer::account_discriminator;
use chain_sol::MailerProgram;
use mailer_client::{
    classify_address, detect_wallet_type, is_evm_address, is_solana_address, validate_amount,
    ChainConnector, ChainFamily, ClientError, ClientOptions, EvmConfig, EvmContracts,
    EvmProvider, EvmSigner, EvmTransactionRequest, LocalEvmSigner, LocalSolanaSigner, MailerClient,
    MailerConfig,
    OperationDetails, ProviderError, SolanaConfig, SolanaConnection, SolanaPrograms, TxOptions,
    WalletDescriptor, WalletHandle, WalletMailerClient, WalletProbe,
};
use serde_json::{json, Value};

const EVM_MAILER: &str = "0x000000000000000000000000000000000000dEaD";
const EVM_USDC: &str = "0x1c7D4B196Cb0C7B01d743Fbc6116a902379C7238";
const EVM_SENDER: &str = "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf";
const EVM_DELEGATE: &str = "0x2B5AD5c4795c026514f8317c7a215E218DcCD6cF";
const SOL_PROGRAM: &str = "9FLkBDqfnMr9A6eBzYRxiGR5Sjk9PSwPnTvW5eqDyvpy";
const SOL_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
const SOL_DELEGATE: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";
const EVM_TX_HASH: &str = "0xabababababababababababababababababababababababababababababababab";

const SEND_FEE: u64 = 100_000;
const DELEGATION_FEE: u64 = 10_000_000;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn word(value: u64) -> String {
    format!("{value:064x}")
}

// ---------------------------------------------------------------------------
// EVM doubles
// ---------------------------------------------------------------------------

struct FakeEvmNode {
    calls: Mutex<Vec<String>>,
    receipt_status: &'static str,
    delegate: Mutex<Option<String>>,
    receipts_pending: bool,
}

impl FakeEvmNode {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            receipt_status: "0x1",
            delegate: Mutex::new(None),
            receipts_pending: false,
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn answer_call(&self, data: &str) -> Value {
        let bytes = hex::decode(data.trim_start_matches("0x")).unwrap();
        let selector: [u8; 4] = bytes[..4].try_into().unwrap();

        let out = if selector == abi::selector(evm_mailer::SEND_FEE) {
            word(SEND_FEE)
        } else if selector == abi::selector(evm_mailer::DELEGATION_FEE) {
            word(DELEGATION_FEE)
        } else if selector == abi::selector(evm_mailer::GET_OWNER_CLAIMABLE) {
            word(777)
        } else if selector == abi::selector(evm_mailer::GET_RECIPIENT_CLAIMABLE) {
            format!("{}{}{}", word(90_000), word(1_700_000_000), word(0))
        } else if selector == abi::selector(evm_mailer::DELEGATIONS) {
            match self.delegate.lock().unwrap().as_deref() {
                Some(addr) => format!("{:0>64}", addr.trim_start_matches("0x").to_lowercase()),
                None => word(0),
            }
        } else {
            panic!("unexpected selector {}", hex::encode(selector));
        };
        json!(format!("0x{out}"))
    }
}

#[async_trait]
impl EvmProvider for FakeEvmNode {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        self.calls.lock().unwrap().push(method.to_string());
        match method {
            "eth_call" => {
                assert_eq!(params[0]["to"], EVM_MAILER);
                Ok(self.answer_call(params[0]["data"].as_str().unwrap()))
            }
            "eth_getTransactionReceipt" if self.receipts_pending => Ok(Value::Null),
            "eth_getTransactionReceipt" => Ok(json!({
                "transactionHash": params[0],
                "blockNumber": "0x2a",
                "status": self.receipt_status,
            })),
            other => Err(ProviderError::Rpc {
                code: -32601,
                message: format!("method {other} not found"),
            }),
        }
    }
}

/// An injected browser-style EVM wallet that records what it was asked to
/// submit.
#[derive(Default)]
struct RecordingEvmWallet {
    submitted: Mutex<Vec<EvmTransactionRequest>>,
}

impl WalletProbe for RecordingEvmWallet {
    fn exposes_address(&self) -> bool {
        true
    }

    fn exposes_request(&self) -> bool {
        true
    }
}

#[async_trait]
impl EvmSigner for RecordingEvmWallet {
    fn address(&self) -> String {
        EVM_SENDER.to_string()
    }

    async fn send_transaction(&self, request: EvmTransactionRequest) -> Result<String, ProviderError> {
        self.submitted.lock().unwrap().push(request);
        Ok(EVM_TX_HASH.to_string())
    }
}

// ---------------------------------------------------------------------------
// Solana doubles
// ---------------------------------------------------------------------------

struct FakeCluster {
    calls: Mutex<Vec<String>>,
    accounts: Mutex<HashMap<String, Vec<u8>>>,
    sent: Mutex<Vec<Vec<u8>>>,
    status_err: Option<Value>,
}

impl FakeCluster {
    fn new(program: &MailerProgram) -> Self {
        let cluster = Self {
            calls: Mutex::new(Vec::new()),
            accounts: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
            status_err: None,
        };
        cluster.put_account(&program.mailer_state, mailer_state_bytes());
        cluster
    }

    fn put_account(&self, address: &[u8; 32], data: Vec<u8>) {
        self.accounts
            .lock()
            .unwrap()
            .insert(chain_sol::bytes_to_address(address), data);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl SolanaConnection for FakeCluster {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        self.calls.lock().unwrap().push(method.to_string());
        match method {
            "getLatestBlockhash" => Ok(json!({
                "context": { "slot": 300 },
                "value": {
                    "blockhash": chain_sol::bytes_to_address(&[7u8; 32]),
                    "lastValidBlockHeight": 400
                }
            })),
            "getAccountInfo" => {
                let address = params[0].as_str().unwrap();
                Ok(match self.accounts.lock().unwrap().get(address) {
                    Some(data) => json!({ "value": {
                        "data": [BASE64.encode(data), "base64"],
                        "lamports": 1_000_000,
                    } }),
                    None => json!({ "value": null }),
                })
            }
            "sendTransaction" => {
                let wire = BASE64.decode(params[0].as_str().unwrap()).unwrap();
                let signature = chain_sol::transaction_signature(&wire).unwrap();
                self.sent.lock().unwrap().push(wire);
                Ok(json!(signature))
            }
            "getSignatureStatuses" => Ok(json!({ "value": [{
                "slot": 321,
                "confirmations": null,
                "confirmationStatus": "confirmed",
                "err": self.status_err.clone(),
            }] })),
            other => Err(ProviderError::Rpc {
                code: -32601,
                message: format!("method {other} not found"),
            }),
        }
    }
}

fn mailer_state_bytes() -> Vec<u8> {
    let mut data = account_discriminator("MailerState").to_vec();
    data.extend_from_slice(&[0x11; 32]);
    data.extend_from_slice(&chain_sol::address_to_bytes(SOL_MINT).unwrap());
    data.extend_from_slice(&SEND_FEE.to_le_bytes());
    data.extend_from_slice(&DELEGATION_FEE.to_le_bytes());
    data.extend_from_slice(&555u64.to_le_bytes());
    data.extend_from_slice(&(60i64 * 24 * 3600).to_le_bytes());
    data.push(255);
    data
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

struct FakeConnector {
    evm: Arc<FakeEvmNode>,
    solana: Arc<FakeCluster>,
}

impl ChainConnector for FakeConnector {
    fn evm_provider(&self, _config: &EvmConfig) -> mailer_client::Result<Arc<dyn EvmProvider>> {
        Ok(self.evm.clone())
    }

    fn solana_connection(
        &self,
        _config: &SolanaConfig,
    ) -> mailer_client::Result<Arc<dyn SolanaConnection>> {
        Ok(self.solana.clone())
    }
}

fn evm_config() -> EvmConfig {
    EvmConfig {
        rpc: "http://127.0.0.1:8545".into(),
        chain_id: 31337,
        contracts: EvmContracts {
            mailer: EVM_MAILER.into(),
            usdc: EVM_USDC.into(),
        },
    }
}

fn solana_config() -> SolanaConfig {
    SolanaConfig {
        rpc: "http://127.0.0.1:8899".into(),
        cluster: Some("localnet".into()),
        programs: SolanaPrograms {
            mailer: SOL_PROGRAM.into(),
        },
        usdc_mint: SOL_MINT.into(),
    }
}

fn program() -> MailerProgram {
    MailerProgram::new(
        chain_sol::address_to_bytes(SOL_PROGRAM).unwrap(),
        chain_sol::address_to_bytes(SOL_MINT).unwrap(),
    )
    .unwrap()
}

fn fast_options() -> ClientOptions {
    ClientOptions {
        rpc_timeout: Duration::from_secs(1),
        confirmation_timeout: Duration::from_secs(5),
        poll_interval: Duration::from_millis(1),
        tx: TxOptions::default(),
    }
}

struct Harness {
    client: MailerClient,
    evm: Arc<FakeEvmNode>,
    solana: Arc<FakeCluster>,
}

fn harness_with(config: MailerConfig, evm: FakeEvmNode, options: ClientOptions) -> Harness {
    init_tracing();
    let evm = Arc::new(evm);
    let solana = Arc::new(FakeCluster::new(&program()));
    let connector = Arc::new(FakeConnector {
        evm: evm.clone(),
        solana: solana.clone(),
    });
    let client = MailerClient::with_connector(config, options, connector).unwrap();
    Harness {
        client,
        evm,
        solana,
    }
}

fn harness() -> Harness {
    harness_with(
        MailerConfig {
            evm: Some(evm_config()),
            solana: Some(solana_config()),
        },
        FakeEvmNode::new(),
        fast_options(),
    )
}

fn evm_wallet() -> (Arc<RecordingEvmWallet>, WalletHandle) {
    let wallet = Arc::new(RecordingEvmWallet::default());
    (wallet.clone(), WalletHandle::Evm(wallet))
}

fn solana_wallet() -> WalletHandle {
    WalletHandle::solana(LocalSolanaSigner::new(&[0x42; 32]))
}

// ---------------------------------------------------------------------------
// Address classification and detection
// ---------------------------------------------------------------------------

#[test]
fn evm_shaped_strings_classify_as_evm() {
    for i in 0u64..64 {
        let address = format!("0x{:040x}", i.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        assert!(is_evm_address(&address), "{address}");
        assert!(!is_solana_address(&address), "{address}");
        assert_eq!(classify_address(&address), Some(ChainFamily::Evm));
    }
}

#[test]
fn base58_keys_classify_as_solana() {
    for i in 0u8..=255 {
        let mut key = [i; 32];
        key[0] = i.wrapping_mul(31);
        let address = chain_sol::bytes_to_address(&key);
        assert!(is_solana_address(&address), "{address}");
        assert!(!is_evm_address(&address), "{address}");
        assert_eq!(classify_address(&address), Some(ChainFamily::Solana));
    }
}

#[test]
fn garbage_never_classifies() {
    assert_eq!(classify_address(""), None);
    assert_eq!(classify_address("invalid-address-format"), None);
}

#[test]
fn descriptor_detection() {
    let solana = WalletDescriptor::new(json!({ "publicKey": "k", "signTransaction": "fn" }));
    assert_eq!(detect_wallet_type(&solana).unwrap(), ChainFamily::Solana);

    let evm = WalletDescriptor::new(json!({ "address": "0x1", "request": "fn" }));
    assert_eq!(detect_wallet_type(&evm).unwrap(), ChainFamily::Evm);

    let unknown = WalletDescriptor::new(json!({ "someProperty": "value" }));
    assert!(matches!(
        detect_wallet_type(&unknown),
        Err(ClientError::UnsupportedWallet(_))
    ));
}

// ---------------------------------------------------------------------------
// EVM dispatch
// ---------------------------------------------------------------------------

#[tokio::test]
async fn evm_send_returns_hash_and_block() {
    let h = harness();
    let (wallet, handle) = evm_wallet();

    let result = h
        .client
        .send_message(&handle, ChainFamily::Evm, "Hello", "World", true, false)
        .await
        .unwrap();

    assert_eq!(result.chain_type, ChainFamily::Evm);
    assert_eq!(result.transaction_hash, EVM_TX_HASH);
    assert!(result.transaction_hash.starts_with("0x"));
    assert!(hex::decode(&result.transaction_hash[2..]).is_ok());
    assert_eq!(result.block_number(), Some(42));
    assert_eq!(result.slot(), None);
    assert_eq!(
        result.details,
        OperationDetails::Send {
            fee_quote: SEND_FEE.into(),
            is_priority: true,
            resolve_sender_to_name: false,
        }
    );

    let submitted = wallet.submitted.lock().unwrap();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].to, EVM_MAILER);
    assert_eq!(submitted[0].data, evm_mailer::encode_send("Hello", "World", true, false));
}

#[tokio::test]
async fn standard_send_carries_full_fee_quote() {
    let h = harness();
    let (_, handle) = evm_wallet();

    let result = h
        .client
        .send_message(&handle, ChainFamily::Evm, "Hello", "World", false, false)
        .await
        .unwrap();

    // The quote is the contract's full sendFee; the reduced debit happens on chain.
    assert_eq!(result.fee_quote(), Some(SEND_FEE.into()));
    assert!(matches!(
        result.details,
        OperationDetails::Send { is_priority: false, .. }
    ));

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["details"]["fee"], SEND_FEE);
    assert_eq!(json["details"]["isPriority"], false);
}

#[tokio::test]
async fn local_signer_for_another_chain_is_refused() {
    let h = harness();
    let signer = LocalEvmSigner::new(&[0x01; 32], 1, h.evm.clone()).unwrap();
    let handle = WalletHandle::evm(signer);

    let err = h
        .client
        .send_message(&handle, ChainFamily::Evm, "Hello", "World", true, false)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::WalletMismatch(_)));
    assert!(err.to_string().contains("chain 1"));
    assert!(err.to_string().contains("31337"));

    let err = h
        .client
        .claim_revenue(&handle, ChainFamily::Evm)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::WalletMismatch(_)));
    assert!(h.evm.calls().is_empty());
}

#[tokio::test]
async fn subject_bounds_are_checked_before_any_chain_call() {
    let h = harness();
    let (wallet, handle) = evm_wallet();

    for subject in [String::new(), "s".repeat(201)] {
        let err = h
            .client
            .send_message(&handle, ChainFamily::Evm, &subject, "body", false, false)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }
    assert!(h.evm.calls().is_empty());
    assert!(wallet.submitted.lock().unwrap().is_empty());

    for subject in ["s".to_string(), "s".repeat(200)] {
        h.client
            .send_message(&handle, ChainFamily::Evm, &subject, "body", false, false)
            .await
            .unwrap();
    }
    assert_eq!(wallet.submitted.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn cross_family_delegate_is_rejected_without_submission() {
    let h = harness();
    let (wallet, handle) = evm_wallet();

    let err = h
        .client
        .delegate_to(&handle, ChainFamily::Evm, SOL_DELEGATE)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ClientError::AddressFormat {
            expected: ChainFamily::Evm,
            ..
        }
    ));
    assert!(wallet.submitted.lock().unwrap().is_empty());
    assert!(h.evm.calls().is_empty());
}

#[tokio::test]
async fn evm_delegate_and_clear() {
    let h = harness();
    let (wallet, handle) = evm_wallet();

    let set = h
        .client
        .delegate_to(&handle, ChainFamily::Evm, &EVM_DELEGATE.to_lowercase())
        .await
        .unwrap();
    assert_eq!(
        set.details,
        OperationDetails::Delegate {
            delegate: Some(EVM_DELEGATE.to_string()),
            fee_quote: DELEGATION_FEE.into(),
        }
    );

    let cleared = h
        .client
        .clear_delegation(&handle, ChainFamily::Evm)
        .await
        .unwrap();
    assert_eq!(
        cleared.details,
        OperationDetails::Delegate {
            delegate: None,
            fee_quote: 0
        }
    );

    let submitted = wallet.submitted.lock().unwrap();
    assert_eq!(
        submitted[1].data,
        evm_mailer::encode_delegate_to(chain_eth::address::ZERO_ADDRESS).unwrap()
    );
}

#[tokio::test]
async fn evm_reverted_transaction_is_chain_error() {
    let mut node = FakeEvmNode::new();
    node.receipt_status = "0x0";
    let h = harness_with(
        MailerConfig {
            evm: Some(evm_config()),
            solana: None,
        },
        node,
        fast_options(),
    );
    let (_, handle) = evm_wallet();

    let err = h
        .client
        .claim_revenue(&handle, ChainFamily::Evm)
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("evm operation failed: "));
    assert!(err.to_string().contains("reverted"));
}

#[tokio::test(start_paused = true)]
async fn evm_confirmation_times_out() {
    let mut node = FakeEvmNode::new();
    node.receipts_pending = true;
    let options = ClientOptions {
        confirmation_timeout: Duration::from_secs(60),
        poll_interval: Duration::from_millis(500),
        ..fast_options()
    };
    let h = harness_with(
        MailerConfig {
            evm: Some(evm_config()),
            solana: None,
        },
        node,
        options,
    );
    let (_, handle) = evm_wallet();

    let err = h
        .client
        .claim_owner_share(&handle, ChainFamily::Evm)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "evm operation failed: timeout after 60000ms");
}

#[tokio::test]
async fn evm_reads() {
    let h = harness();

    assert_eq!(h.client.get_send_fee(ChainFamily::Evm).await.unwrap(), 100_000);
    assert_eq!(
        h.client.get_delegation_fee(ChainFamily::Evm).await.unwrap(),
        10_000_000
    );
    assert_eq!(h.client.get_owner_claimable(ChainFamily::Evm).await.unwrap(), 777);
    assert_eq!(
        h.client.get_delegation(ChainFamily::Evm, EVM_SENDER).await.unwrap(),
        None
    );

    *h.evm.delegate.lock().unwrap() = Some(EVM_DELEGATE.to_string());
    assert_eq!(
        h.client
            .get_delegation(ChainFamily::Evm, EVM_SENDER)
            .await
            .unwrap()
            .as_deref(),
        Some(EVM_DELEGATE)
    );

    let claimable = h
        .client
        .get_claimable(ChainFamily::Evm, EVM_SENDER)
        .await
        .unwrap();
    assert_eq!(claimable.amount, 90_000);
    assert_eq!(claimable.expires_at, 1_700_000_000);
    assert!(!claimable.is_expired);
}

#[tokio::test]
async fn evm_tx_options_pass_through() {
    let options = ClientOptions {
        tx: TxOptions {
            gas_limit: Some(250_000),
            max_fee_per_gas: Some(30_000_000_000),
            max_priority_fee_per_gas: Some(1_500_000_000),
            ..TxOptions::default()
        },
        ..fast_options()
    };
    let h = harness_with(
        MailerConfig {
            evm: Some(evm_config()),
            solana: None,
        },
        FakeEvmNode::new(),
        options,
    );
    let (wallet, handle) = evm_wallet();

    h.client
        .send_to_email(&handle, ChainFamily::Evm, "bob@example.com", "s", "b")
        .await
        .unwrap();

    let submitted = wallet.submitted.lock().unwrap();
    assert_eq!(submitted[0].gas_limit, Some(250_000));
    assert_eq!(submitted[0].max_fee_per_gas, Some(30_000_000_000));
    assert_eq!(submitted[0].max_priority_fee_per_gas, Some(1_500_000_000));
}

// ---------------------------------------------------------------------------
// Solana dispatch
// ---------------------------------------------------------------------------

#[tokio::test]
async fn solana_send_returns_signature_and_slot() {
    let h = harness();
    let handle = solana_wallet();

    let result = h
        .client
        .send_message(&handle, ChainFamily::Solana, "Hello", "World", false, true)
        .await
        .unwrap();

    assert_eq!(result.chain_type, ChainFamily::Solana);
    assert_eq!(
        bs58::decode(&result.transaction_hash).into_vec().unwrap().len(),
        64
    );
    assert_eq!(result.slot(), Some(321));
    assert_eq!(result.block_number(), None);
    assert_eq!(result.fee_quote(), Some(SEND_FEE.into()));

    let sent = h.solana.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(
        chain_sol::transaction_signature(&sent[0]).unwrap(),
        result.transaction_hash
    );
}

#[tokio::test]
async fn solana_validation_happens_before_network() {
    let h = harness();
    let handle = solana_wallet();

    let err = h
        .client
        .send_message(&handle, ChainFamily::Solana, &"x".repeat(201), "b", true, false)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));

    let err = h
        .client
        .delegate_to(&handle, ChainFamily::Solana, EVM_DELEGATE)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::AddressFormat {
            expected: ChainFamily::Solana,
            ..
        }
    ));

    assert!(h.solana.calls().is_empty());
}

#[tokio::test]
async fn solana_compute_budget_is_prepended() {
    let options = ClientOptions {
        tx: TxOptions {
            compute_unit_limit: Some(200_000),
            compute_unit_price: Some(5_000),
            ..TxOptions::default()
        },
        ..fast_options()
    };
    let h = harness_with(
        MailerConfig {
            evm: None,
            solana: Some(solana_config()),
        },
        FakeEvmNode::new(),
        options,
    );

    h.client
        .claim_revenue(&solana_wallet(), ChainFamily::Solana)
        .await
        .unwrap();

    let wire = &h.solana.sent()[0];
    let budget_program =
        chain_sol::address_to_bytes(chain_sol::transaction::COMPUTE_BUDGET_PROGRAM).unwrap();
    assert!(wire.windows(32).any(|w| w == budget_program));
}

#[tokio::test]
async fn solana_delegation_roundtrip() {
    let h = harness();
    let handle = solana_wallet();
    let delegator = handle.address();

    assert_eq!(
        h.client
            .get_delegation(ChainFamily::Solana, &delegator)
            .await
            .unwrap(),
        None
    );

    let result = h
        .client
        .delegate_to(&handle, ChainFamily::Solana, SOL_DELEGATE)
        .await
        .unwrap();
    assert_eq!(result.fee_quote(), Some(DELEGATION_FEE.into()));

    let delegator_key = chain_sol::address_to_bytes(&delegator).unwrap();
    let mut account = account_discriminator("Delegation").to_vec();
    account.extend_from_slice(&delegator_key);
    account.push(1);
    account.extend_from_slice(&chain_sol::address_to_bytes(SOL_DELEGATE).unwrap());
    account.push(254);
    h.solana
        .put_account(&program().delegation_address(&delegator_key).unwrap(), account);

    assert_eq!(
        h.client
            .get_delegation(ChainFamily::Solana, &delegator)
            .await
            .unwrap()
            .as_deref(),
        Some(SOL_DELEGATE)
    );
}

#[tokio::test]
async fn solana_claimable_reads() {
    let h = harness();
    let recipient = solana_wallet().address();
    let recipient_key = chain_sol::address_to_bytes(&recipient).unwrap();

    let none = h
        .client
        .get_claimable(ChainFamily::Solana, &recipient)
        .await
        .unwrap();
    assert_eq!(none.amount, 0);
    assert!(!none.is_expired);

    let mut account = account_discriminator("RecipientClaim").to_vec();
    account.extend_from_slice(&recipient_key);
    account.extend_from_slice(&90_000u64.to_le_bytes());
    account.extend_from_slice(&1_000i64.to_le_bytes());
    account.push(255);
    h.solana
        .put_account(&program().claim_address(&recipient_key).unwrap(), account);

    let claim = h
        .client
        .get_claimable(ChainFamily::Solana, &recipient)
        .await
        .unwrap();
    assert_eq!(claim.amount, 90_000);
    assert_eq!(claim.expires_at, 1_000 + 60 * 24 * 3600);
    assert!(claim.is_expired);

    assert_eq!(
        h.client.get_owner_claimable(ChainFamily::Solana).await.unwrap(),
        555
    );
}

#[tokio::test]
async fn solana_failed_status_is_chain_error() {
    init_tracing();
    let evm = Arc::new(FakeEvmNode::new());
    let mut cluster = FakeCluster::new(&program());
    cluster.status_err = Some(json!({ "InstructionError": [0, { "Custom": 1 }] }));
    let solana = Arc::new(cluster);
    let client = MailerClient::with_connector(
        MailerConfig {
            evm: None,
            solana: Some(solana_config()),
        },
        fast_options(),
        Arc::new(FakeConnector { evm, solana }),
    )
    .unwrap();

    let err = client
        .claim_owner_share(&solana_wallet(), ChainFamily::Solana)
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("solana operation failed: "));
    assert!(err.to_string().contains("InstructionError"));
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn declared_chain_must_match_wallet() {
    let h = harness();
    let err = h
        .client
        .claim_revenue(&solana_wallet(), ChainFamily::Evm)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::WalletMismatch(_)));
    assert!(h.evm.calls().is_empty());
}

#[tokio::test]
async fn evm_wallet_with_solana_only_config() {
    let h = harness_with(
        MailerConfig {
            evm: None,
            solana: Some(solana_config()),
        },
        FakeEvmNode::new(),
        fast_options(),
    );
    let (wallet, handle) = evm_wallet();
    let bound = WalletMailerClient::from_client(handle, h.client).unwrap();
    assert_eq!(bound.chain_type(), ChainFamily::Evm);

    let err = bound.send_message("s", "b", true, false).await.unwrap_err();
    assert!(matches!(err, ClientError::ConfigurationMissing(ChainFamily::Evm)));
    assert!(err.to_string().contains("EVM configuration required"));

    let err = bound.get_send_fee().await.unwrap_err();
    assert!(err.to_string().contains("EVM configuration required"));
    assert!(wallet.submitted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn wallet_client_routes_by_detected_chain() {
    let h = harness();
    let bound = WalletMailerClient::from_client(solana_wallet(), h.client).unwrap();
    assert_eq!(bound.chain_type(), ChainFamily::Solana);

    let result = bound.send_prepared("mail-1", true, false).await.unwrap();
    assert_eq!(result.chain_type, ChainFamily::Solana);
    assert_eq!(bound.get_send_fee().await.unwrap(), SEND_FEE as u128);
    assert_eq!(bound.get_delegation().await.unwrap(), None);
    assert!(h.evm.calls().is_empty());
}

#[test]
fn amount_validation() {
    for err in [
        validate_amount(-1).unwrap_err(),
        validate_amount("-10").unwrap_err(),
    ] {
        assert_eq!(err.to_string(), "Amount cannot be negative");
    }
    assert_eq!(validate_amount(10.7).unwrap(), 10);
    assert_eq!(validate_amount("100").unwrap(), 100);
}

use gloo_net::http::{Request, RequestBuilder};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;
use wasm_bindgen_futures::spawn_local;
use web_sys::{InputEvent, RequestCredentials};
use yew::prelude::*;

const API_BASE_URL: &str = "http://localhost:5000";

const MIN_PASSWORD_LENGTH: usize = 6;

/// Currencies offered as a base currency in the settings page.
const CURRENCIES: [&str; 8] = ["USD", "EUR", "GBP", "JPY", "PLN", "CHF", "CAD", "AUD"];

#[derive(Clone, PartialEq, Deserialize, Serialize)]
struct Transaction {
    pub id: Option<i32>,
    pub amount: f64,
    pub currency: String,
    /// Value of this transaction converted into the base currency.
    /// Absent when the transaction is already in the base currency.
    pub rate: Option<f64>,
    pub tag: String,
    #[serde(rename = "type")]
    pub kind: TxKind,
}

#[derive(Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
enum TxKind {
    Income,
    Expense,
}

impl TxKind {
    fn label(self) -> &'static str {
        match self {
            TxKind::Income => "Income",
            TxKind::Expense => "Expense",
        }
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
struct WalletSettings {
    base_currency: String,
}

fn default_settings() -> WalletSettings {
    WalletSettings {
        base_currency: "USD".to_string(),
    }
}

/// Per-tag aggregate of income value, derived per render.
#[derive(Clone, PartialEq, Debug)]
struct TagShare {
    percentage: f64,
    amount: f64,
}

#[derive(Clone, PartialEq, Default)]
struct FieldErrors {
    email: Option<String>,
    password: Option<String>,
}

enum AuthError {
    /// Slash-delimited code from the auth service, e.g. `auth/wrong-password`.
    Code(String),
    Network,
}

impl AuthError {
    fn field_errors(self) -> FieldErrors {
        match self {
            AuthError::Code(code) => human_error_parse(&code),
            AuthError::Network => FieldErrors {
                email: Some("Network error".to_string()),
                password: None,
            },
        }
    }
}

#[derive(Deserialize)]
struct AuthFailure {
    error: String,
}

#[derive(Deserialize)]
struct AuthSuccess {
    access_token: Option<String>,
}

#[derive(Clone, Copy, PartialEq)]
enum CurrencyChangeMode {
    ConvertAll,
    DeleteAll,
}

impl CurrencyChangeMode {
    fn as_str(self) -> &'static str {
        match self {
            CurrencyChangeMode::ConvertAll => "convertAll",
            CurrencyChangeMode::DeleteAll => "deleteAll",
        }
    }
}

fn stored_token() -> Option<String> {
    if let Some(window) = web_sys::window() {
        if let Ok(Some(storage)) = window.local_storage() {
            if let Ok(token) = storage.get_item("access_token") {
                return token;
            }
        }
    }
    None
}

fn store_token(token: &str) {
    if let Some(window) = web_sys::window() {
        if let Ok(Some(storage)) = window.local_storage() {
            let _ = storage.set_item("access_token", token);
        }
    }
}

fn clear_token() {
    if let Some(window) = web_sys::window() {
        if let Ok(Some(storage)) = window.local_storage() {
            let _ = storage.remove_item("access_token");
        }
    }
}

fn reload_page() {
    if let Some(window) = web_sys::window() {
        let _ = window.location().reload();
    }
}

/// Attaches cookie credentials and the stored bearer token, if any.
fn authorized(builder: RequestBuilder) -> RequestBuilder {
    let mut builder = builder.credentials(RequestCredentials::Include);
    if let Some(token) = stored_token() {
        builder = builder.header("Authorization", &format!("Bearer {}", token));
    }
    builder
}

async fn auth_request(endpoint: &str, body: serde_json::Value) -> Result<(), AuthError> {
    let url = format!("{}{}", API_BASE_URL, endpoint);
    let builder = Request::post(&url)
        .credentials(RequestCredentials::Include)
        .json(&body)
        .map_err(|_| AuthError::Network)?;

    let resp = builder.send().await.map_err(|err| {
        log::warn!("auth request to {} failed: {}", endpoint, err);
        AuthError::Network
    })?;

    if resp.ok() {
        if let Ok(json) = resp.json::<AuthSuccess>().await {
            if let Some(token) = json.access_token {
                store_token(&token);
            }
        }
        Ok(())
    } else {
        match resp.json::<AuthFailure>().await {
            Ok(failure) => Err(AuthError::Code(failure.error)),
            Err(_) => Err(AuthError::Code("auth/internal-error".to_string())),
        }
    }
}

async fn login_email(email: &str, password: &str) -> Result<(), AuthError> {
    let body = serde_json::json!({ "email": email, "password": password });
    auth_request("/api/auth/login", body).await
}

async fn sign_up_email(email: &str, password: &str) -> Result<(), AuthError> {
    let body = serde_json::json!({ "email": email, "password": password });
    auth_request("/api/auth/signup", body).await
}

async fn sign_in_google() -> Result<(), AuthError> {
    auth_request("/api/auth/google", serde_json::json!({})).await
}

async fn logout() {
    let url = format!("{}/api/auth/logout", API_BASE_URL);
    if let Err(err) = authorized(Request::post(&url)).send().await {
        log::warn!("logout request failed: {}", err);
    }
    clear_token();
}

async fn fetch_wallet() -> Option<WalletSettings> {
    let url = format!("{}/api/wallet", API_BASE_URL);
    match authorized(Request::get(&url)).send().await {
        Ok(resp) if resp.ok() => match resp.json::<WalletSettings>().await {
            Ok(wallet) => Some(wallet),
            Err(err) => {
                log::warn!("malformed wallet payload: {}", err);
                None
            }
        },
        Ok(resp) => {
            log::warn!("wallet fetch failed with status {}", resp.status());
            None
        }
        Err(err) => {
            log::warn!("wallet fetch failed: {}", err);
            None
        }
    }
}

async fn fetch_transactions() -> Vec<Transaction> {
    let url = format!("{}/api/transactions", API_BASE_URL);
    match authorized(Request::get(&url)).send().await {
        Ok(resp) if resp.ok() => match resp.json::<Vec<Transaction>>().await {
            Ok(list) => list,
            Err(err) => {
                log::warn!("malformed transaction list: {}", err);
                Vec::new()
            }
        },
        Ok(resp) => {
            log::warn!("transaction fetch failed with status {}", resp.status());
            Vec::new()
        }
        Err(err) => {
            log::warn!("transaction fetch failed: {}", err);
            Vec::new()
        }
    }
}

/// Asks the backend to move the account to a new base currency, either
/// converting every past transaction or deleting them all.
async fn change_currency(currency: &str, mode: CurrencyChangeMode) -> bool {
    let url = format!("{}/api/wallet/currency", API_BASE_URL);
    let body = serde_json::json!({ "currency": currency, "mode": mode.as_str() });
    let builder = match authorized(Request::post(&url)).json(&body) {
        Ok(builder) => builder,
        Err(err) => {
            log::warn!("currency change payload failed: {}", err);
            return false;
        }
    };
    match builder.send().await {
        Ok(resp) if resp.ok() => true,
        Ok(resp) => {
            log::warn!("currency change failed with status {}", resp.status());
            false
        }
        Err(err) => {
            log::warn!("currency change failed: {}", err);
            false
        }
    }
}

async fn delete_all_transactions() {
    let url = format!("{}/api/transactions", API_BASE_URL);
    match authorized(Request::delete(&url)).send().await {
        Ok(resp) if resp.ok() => {}
        Ok(resp) => log::warn!("bulk delete failed with status {}", resp.status()),
        Err(err) => log::warn!("bulk delete failed: {}", err),
    }
}

/// Value of a transaction in the base currency.
fn rate_in_base(tx: &Transaction) -> f64 {
    tx.rate.unwrap_or(tx.amount)
}

/// Groups income transactions by tag and computes each tag's share of the
/// total value, sorted by descending percentage. Empty input (or a zero
/// total) yields an empty list.
fn income_breakdown(incomes: &[Transaction]) -> Vec<(String, TagShare)> {
    let total: f64 = incomes.iter().map(rate_in_base).sum();
    if total <= 0.0 {
        return Vec::new();
    }

    let mut shares: HashMap<String, TagShare> = HashMap::new();
    for tx in incomes {
        let amount = rate_in_base(tx);
        let entry = shares.entry(tx.tag.clone()).or_insert(TagShare {
            percentage: 0.0,
            amount: 0.0,
        });
        entry.amount += amount;
        entry.percentage += amount / total * 100.0;
    }

    let mut list: Vec<(String, TagShare)> = shares.into_iter().collect();
    list.sort_by(|a, b| {
        b.1.percentage
            .partial_cmp(&a.1.percentage)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    list
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[\w\-.]+@([\w\-]+\.)+\w{2,4}$").expect("email pattern is valid")
    })
}

fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

/// Gate for the login and sign-up buttons: a malformed email or a password
/// under six characters blocks submission.
fn submit_disabled(email: &str, password: &str) -> bool {
    !is_valid_email(email) || password.chars().count() < MIN_PASSWORD_LENGTH
}

/// Turns a service error code like `auth/wrong-password` into a readable
/// message and routes it to the field it concerns: the password field when
/// the message mentions "password", the email field otherwise. A code
/// without a slash is used whole.
fn human_error_parse(code: &str) -> FieldErrors {
    let raw = code.split_once('/').map(|(_, rest)| rest).unwrap_or(code);
    let spaced = raw.replace('-', " ");
    let mut chars = spaced.chars();
    let message = match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => spaced,
    };

    if message.contains("password") {
        FieldErrors {
            email: None,
            password: Some(message),
        }
    } else {
        FieldErrors {
            email: Some(message),
            password: None,
        }
    }
}

fn format_with_commas(value: i64) -> String {
    let is_negative = value < 0;
    let s = value.abs().to_string().chars().rev().collect::<Vec<char>>();
    let mut out = Vec::new();
    for (i, ch) in s.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(*ch);
    }
    let formatted: String = out.into_iter().rev().collect();
    if is_negative {
        format!("-{}", formatted)
    } else {
        formatted
    }
}

fn format_currency(amount: f64, currency: &str) -> String {
    let cents = (amount.abs() * 100.0).round() as i64;
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!(
        "{}{}.{:02} {}",
        sign,
        format_with_commas(cents / 100),
        cents % 100,
        currency
    )
}

/// Whole-number percentage, falling back to one decimal when the value
/// rounds to zero.
fn format_percentage(percentage: f64) -> String {
    let rounded = percentage.round();
    if rounded == 0.0 {
        format!("{:.1}%", percentage)
    } else {
        format!("{}%", rounded as i64)
    }
}

const TAG_PALETTE: [&str; 8] = [
    "#173E63", "#1D617A", "#2E86AB", "#F18F01", "#C73E1D", "#3B7A57", "#7768AE", "#B2CBDE",
];

/// Deterministic chart color for a tag.
fn tag_color(tag: &str) -> &'static str {
    let hash: usize = tag.bytes().map(|b| b as usize).sum();
    TAG_PALETTE[hash % TAG_PALETTE.len()]
}

#[derive(Clone, Copy, PartialEq)]
enum AuthStatus {
    Checking,
    Authenticated,
    Unauthenticated,
}

#[derive(Clone, Copy, PartialEq)]
enum Page {
    Wallet,
    Settings,
}

#[derive(Clone, Copy, PartialEq)]
enum PendingAuth {
    None,
    Login,
    SignUp,
    Google,
}

#[derive(Clone, Copy, PartialEq)]
enum StatIcon {
    UpRight,
    CreditCard,
    Wallet,
}

#[derive(Properties, PartialEq)]
struct LayoutProps {
    children: Children,
    active_page: Page,
    on_select: Callback<Page>,
}

#[function_component(Layout)]
fn layout(props: &LayoutProps) -> Html {
    html! {
        <div class="flex h-screen bg-background">
            <div class="hidden md:flex">
                <Sidebar active_page={props.active_page} on_select={props.on_select.clone()} />
            </div>

            <div class="flex-1 flex flex-col overflow-hidden">
                <main class="flex-1 overflow-y-auto">
                    { for props.children.iter() }
                </main>
            </div>
        </div>
    }
}

struct NavItem {
    label: &'static str,
    page: Page,
    icon: fn() -> Html,
}

#[derive(Properties, PartialEq)]
struct SidebarProps {
    active_page: Page,
    on_select: Callback<Page>,
}

#[function_component(Sidebar)]
fn sidebar(props: &SidebarProps) -> Html {
    let nav_items = vec![
        NavItem {
            label: "Wallet",
            page: Page::Wallet,
            icon: icon_wallet,
        },
        NavItem {
            label: "Settings",
            page: Page::Settings,
            icon: icon_settings,
        },
    ];

    let on_logout = Callback::from(move |_| {
        spawn_local(async move {
            logout().await;
            reload_page();
        });
    });

    html! {
        <div class="w-[220px] h-screen bg-[#D8E1E8] p-4 flex flex-col">
            <div class="flex items-center gap-3 px-2 mb-8">
                <div class="w-12 h-12 bg-[#173E63] rounded-full flex items-center justify-center text-2xl">
                    {"💼"}
                </div>
                <span class="text-[#173E63] text-2xl font-black tracking-tight">{"Poliwallet"}</span>
            </div>

            <div class="flex-1 bg-[#173E63] rounded-[24px] flex flex-col py-6 px-3 shadow-lg">
                <nav class="flex-1 space-y-2">
                    { for nav_items.iter().map(|item| {
                        let is_active = item.page == props.active_page;
                        let class_name = if is_active {
                            "flex items-center gap-3 px-4 py-3 rounded-xl transition-all text-[13px] font-medium bg-[#B2CBDE] text-[#173E63] w-full"
                        } else {
                            "flex items-center gap-3 px-4 py-3 rounded-xl transition-all text-[13px] font-medium text-slate-300 hover:bg-white/5 hover:text-white w-full"
                        };
                        let on_select = props.on_select.clone();
                        let page = item.page;

                        html! {
                            <button type="button" class={class_name} onclick={Callback::from(move |_| on_select.emit(page))}>
                                <span class="shrink-0">{ (item.icon)() }</span>
                                <span class="truncate whitespace-nowrap text-left">{ item.label }</span>
                            </button>
                        }
                    }) }
                </nav>

                <div class="mt-auto pt-4">
                    <button onclick={on_logout} class="flex items-center gap-3 w-full px-4 py-3 rounded-xl hover:bg-white/10 transition-colors text-[13px] font-medium text-slate-300">
                        { icon_log_out() }
                        <span>{"Log Out"}</span>
                    </button>
                </div>
            </div>
        </div>
    }
}

fn page_shell(title: &'static str, actions: Html, children: Html) -> Html {
    html! {
        <div class="p-6 max-w-7xl mx-auto">
            <div class="flex items-center justify-between pb-4 border-b border-border">
                <h1 class="text-2xl font-bold text-foreground">{ title }</h1>
                { actions }
            </div>
            <div class="pt-5 space-y-6">
                { children }
            </div>
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct DonutProps {
    shares: Vec<(String, TagShare)>,
}

#[function_component(Donut)]
fn donut(props: &DonutProps) -> Html {
    let radius = 38.0;
    let circumference = 2.0 * std::f64::consts::PI * radius;

    let mut offset = 0.0;
    let segments = props
        .shares
        .iter()
        .map(|(tag, share)| {
            let length = share.percentage / 100.0 * circumference;
            let segment = html! {
                <circle
                    cx="48" cy="48" r={radius.to_string()}
                    stroke={tag_color(tag)} stroke-width="12" fill="transparent"
                    stroke-dasharray={format!("{} {}", length, circumference)}
                    stroke-dashoffset={(-offset).to_string()}
                />
            };
            offset += length;
            segment
        })
        .collect::<Vec<Html>>();

    html! {
        <svg class="w-24 h-24 transform -rotate-90 shrink-0">
            <circle cx="48" cy="48" r={radius.to_string()} stroke="#e2e8f0" stroke-width="12" fill="transparent" />
            { for segments }
        </svg>
    }
}

#[derive(Properties, PartialEq)]
struct IncomeInfoProps {
    incomes: Vec<Transaction>,
}

/// Breakdown of income by tag: donut chart plus the top five tags with
/// their share and amount. Renders nothing when there are no incomes.
#[function_component(IncomeInfo)]
fn income_info(props: &IncomeInfoProps) -> Html {
    let settings = use_context::<UseStateHandle<WalletSettings>>();
    let currency = settings
        .as_ref()
        .map(|s| s.base_currency.clone())
        .unwrap_or_else(|| "USD".to_string());

    let shares = income_breakdown(&props.incomes);
    if shares.is_empty() {
        return html! {};
    }

    html! {
        <div class="px-2">
            <h2 class="text-lg font-bold text-foreground mb-2 ml-1">{"Your income sources"}</h2>
            <div class="bg-card rounded-[10px] p-4 border border-border flex items-center">
                <Donut shares={shares.clone()} />
                <div class={classes!(
                    "flex", "flex-col", "gap-1", "self-stretch", "ml-4", "flex-grow", "py-1",
                    if shares.len() > 3 { "justify-center" } else { "justify-start" },
                )}>
                    { for shares.iter().take(5).map(|(tag, share)| html! {
                        <div key={tag.clone()} class="flex flex-row justify-between">
                            <div class="flex flex-row items-center">
                                <span
                                    class="w-2.5 h-2.5 mr-3 rounded-full inline-block"
                                    style={format!("background-color: {}", tag_color(tag))}
                                ></span>
                                <span class="text-sm text-foreground">
                                    { format!("{}: {}", tag, format_percentage(share.percentage)) }
                                </span>
                            </div>
                            <span class="text-sm text-right text-foreground">
                                { format_currency(share.amount, &currency) }
                            </span>
                        </div>
                    }) }
                </div>
            </div>
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct StatCardProps {
    title: &'static str,
    amount: f64,
    icon: StatIcon,
    currency: String,
}

#[function_component(StatCard)]
fn stat_card(props: &StatCardProps) -> Html {
    html! {
        <div class="bg-card p-6 rounded-[10px] shadow-sm border border-border flex justify-between items-start">
            <div>
                <p class="text-muted-foreground text-[10px] font-bold mb-1 tracking-widest">{ props.title }</p>
                <h3 class="text-2xl font-bold text-[#1D617A] tracking-tight">{ format_currency(props.amount, &props.currency) }</h3>
            </div>
            <div class="p-3 bg-[#eef4f9] rounded-[10px]">
                {
                    match props.icon {
                        StatIcon::UpRight => icon_arrow_up_right(),
                        StatIcon::CreditCard => icon_credit_card(),
                        StatIcon::Wallet => icon_wallet(),
                    }
                }
            </div>
        </div>
    }
}

#[function_component(WalletPage)]
fn wallet_page() -> Html {
    let settings = use_context::<UseStateHandle<WalletSettings>>();
    let currency = settings
        .as_ref()
        .map(|s| s.base_currency.clone())
        .unwrap_or_else(|| "USD".to_string());

    let transactions = use_state(Vec::<Transaction>::new);
    let loading = use_state(|| true);

    {
        let transactions = transactions.clone();
        let loading = loading.clone();
        use_effect_with_deps(
            move |_| {
                spawn_local(async move {
                    transactions.set(fetch_transactions().await);
                    loading.set(false);
                });
                || ()
            },
            (),
        );
    }

    let incomes: Vec<Transaction> = transactions
        .iter()
        .filter(|tx| tx.kind == TxKind::Income)
        .cloned()
        .collect();

    let total_income: f64 = incomes.iter().map(rate_in_base).sum();
    let total_expenses: f64 = transactions
        .iter()
        .filter(|tx| tx.kind == TxKind::Expense)
        .map(rate_in_base)
        .sum();
    let balance = total_income - total_expenses;

    html! {
        { page_shell(
            "Wallet",
            html! {},
            html! {
                <>
                    <div class="grid grid-cols-1 md:grid-cols-3 gap-6">
                        <StatCard title="Total Income" amount={total_income} icon={StatIcon::UpRight} currency={currency.clone()} />
                        <StatCard title="Total Expenses" amount={total_expenses} icon={StatIcon::CreditCard} currency={currency.clone()} />
                        <StatCard title="Balance" amount={balance} icon={StatIcon::Wallet} currency={currency.clone()} />
                    </div>

                    <IncomeInfo incomes={incomes} />

                    <div class="bg-card rounded-[10px] shadow-sm border border-border overflow-hidden">
                        <div class="p-6 flex justify-between items-center border-b border-border">
                            <h3 class="font-bold text-foreground text-lg">{"Transactions"}</h3>
                        </div>
                        <div class="overflow-x-auto">
                            <table class="w-full text-left border-collapse">
                                <thead>
                                    <tr class="bg-muted/50 text-muted-foreground text-[10px] uppercase tracking-widest">
                                        <th class="px-8 py-4 font-bold">{"Tag"}</th>
                                        <th class="px-8 py-4 font-bold">{"Type"}</th>
                                        <th class="px-8 py-4 font-bold text-right">{"Amount"}</th>
                                        <th class="px-8 py-4 font-bold text-right">{ format!("Value ({})", currency) }</th>
                                    </tr>
                                </thead>
                                <tbody class="divide-y divide-border">
                                    { if *loading {
                                        html! { <tr><td colspan="4" class="px-8 py-6 text-center text-muted-foreground">{"Loading..."}</td></tr> }
                                    } else if transactions.is_empty() {
                                        html! { <tr><td colspan="4" class="px-8 py-6 text-center text-muted-foreground">{"No transactions yet."}</td></tr> }
                                    } else {
                                        html! {
                                            <>
                                                { for transactions.iter().enumerate().map(|(idx, tx)| html! {
                                                    <tr key={idx} class="text-sm hover:bg-muted/30 transition-colors">
                                                        <td class="px-8 py-4">
                                                            <span class="bg-secondary text-secondary-foreground px-3 py-1 rounded-full text-[10px] font-bold">{ tx.tag.clone() }</span>
                                                        </td>
                                                        <td class="px-8 py-4 text-muted-foreground">{ tx.kind.label() }</td>
                                                        <td class="px-8 py-4 text-right text-foreground">{ format_currency(tx.amount, &tx.currency) }</td>
                                                        <td class="px-8 py-4 text-right font-semibold text-foreground">{ format_currency(rate_in_base(tx), &currency) }</td>
                                                    </tr>
                                                }) }
                                            </>
                                        }
                                    }}
                                </tbody>
                            </table>
                        </div>
                    </div>
                </>
            }
        ) }
    }
}

#[function_component(SettingsPage)]
fn settings_page() -> Html {
    let settings = use_context::<UseStateHandle<WalletSettings>>();
    let remote_currency = settings
        .as_ref()
        .map(|s| s.base_currency.clone())
        .unwrap_or_else(|| "USD".to_string());

    let currency = use_state(|| "USD".to_string());
    let dialog_open = use_state(|| false);

    // Mirror the remote base currency into the local select once it arrives.
    {
        let currency = currency.clone();
        use_effect_with_deps(
            move |remote: &String| {
                currency.set(remote.clone());
                || ()
            },
            remote_currency,
        );
    }

    let on_currency_change = {
        let currency = currency.clone();
        Callback::from(move |e: Event| {
            let input: web_sys::HtmlSelectElement = e.target_unchecked_into();
            currency.set(input.value());
        })
    };

    let open_dialog = {
        let dialog_open = dialog_open.clone();
        Callback::from(move |_| dialog_open.set(true))
    };

    let close_dialog = {
        let dialog_open = dialog_open.clone();
        Callback::from(move |_| dialog_open.set(false))
    };

    let on_convert = {
        let currency = currency.clone();
        let dialog_open = dialog_open.clone();
        let settings = settings.clone();
        Callback::from(move |_| {
            let chosen = (*currency).clone();
            let dialog_open = dialog_open.clone();
            let settings = settings.clone();
            spawn_local(async move {
                if change_currency(&chosen, CurrencyChangeMode::ConvertAll).await {
                    if let Some(settings) = settings.as_ref() {
                        settings.set(WalletSettings {
                            base_currency: chosen,
                        });
                    }
                }
                dialog_open.set(false);
            });
        })
    };

    let on_delete = {
        let currency = currency.clone();
        let dialog_open = dialog_open.clone();
        let settings = settings.clone();
        Callback::from(move |_| {
            let chosen = (*currency).clone();
            let dialog_open = dialog_open.clone();
            let settings = settings.clone();
            spawn_local(async move {
                if change_currency(&chosen, CurrencyChangeMode::DeleteAll).await {
                    if let Some(settings) = settings.as_ref() {
                        settings.set(WalletSettings {
                            base_currency: chosen,
                        });
                    }
                }
                dialog_open.set(false);
            });
        })
    };

    let on_delete_all = Callback::from(move |_| {
        spawn_local(async move {
            delete_all_transactions().await;
        });
    });

    let on_logout = Callback::from(move |_| {
        spawn_local(async move {
            logout().await;
            reload_page();
        });
    });

    html! {
        { page_shell(
            "Settings",
            html! {},
            html! {
                <>
                    <div class="grid grid-cols-1 md:grid-cols-2 gap-6">
                        <div class="bg-card rounded-lg p-6 border border-border">
                            <h2 class="text-xl font-bold text-foreground mb-6">{"Preferences"}</h2>
                            <div class="space-y-4">
                                <div>
                                    <label class="block text-sm font-medium text-foreground mb-2">{"Currency"}</label>
                                    <div class="flex items-center gap-3">
                                        <select value={(*currency).clone()} onchange={on_currency_change} class="flex-1 px-4 py-2 bg-input border border-input rounded-lg text-foreground focus:outline-none focus:ring-2 focus:ring-primary">
                                            { for CURRENCIES.iter().map(|option| html! {
                                                <option key={*option} value={*option} selected={*option == currency.as_str()}>{ option }</option>
                                            }) }
                                        </select>
                                        <button onclick={open_dialog} class="bg-primary text-primary-foreground px-4 py-2 rounded-lg text-sm font-bold hover:opacity-90 transition-all">
                                            {"Save"}
                                        </button>
                                    </div>
                                    <p class="text-xs text-muted-foreground mt-2">{"Changing the currency converts or deletes your existing transactions."}</p>
                                </div>
                            </div>
                        </div>

                        <div class="bg-card rounded-lg p-6 border border-border">
                            <h2 class="text-xl font-bold text-foreground mb-6">{"Account"}</h2>
                            <div class="space-y-2">
                                <button onclick={on_logout} class="flex items-center gap-3 w-full px-4 py-3 rounded-lg hover:bg-muted/50 transition-colors text-sm font-medium text-foreground">
                                    { icon_log_out() }
                                    <span>{"Logout"}</span>
                                </button>
                                <button onclick={on_delete_all} class="flex items-center gap-3 w-full px-4 py-3 rounded-lg hover:bg-red-50 transition-colors text-sm font-medium text-red-600">
                                    { icon_trash() }
                                    <span>{"Delete all transactions"}</span>
                                </button>
                            </div>
                        </div>
                    </div>

                    {
                        if *dialog_open {
                            html! {
                                <div class="fixed inset-0 bg-black/40 flex items-center justify-center z-50">
                                    <div class="w-full max-w-md bg-card border border-border rounded-2xl shadow-lg p-6">
                                        <h3 class="text-lg font-bold text-foreground mb-3">
                                            {"Are you sure you want to change your currency?"}
                                        </h3>
                                        <p class="text-sm text-muted-foreground mb-6">
                                            {"You have two options: "}
                                            <strong>{"convert"}</strong>
                                            {" all your past transactions to the new currency, or "}
                                            <strong>{"delete"}</strong>
                                            {" all your transactions."}
                                        </p>
                                        <div class="flex justify-end gap-3">
                                            <button onclick={close_dialog} class="px-4 py-2 rounded-lg text-sm font-bold text-foreground hover:bg-muted/50 transition-colors">
                                                {"Cancel"}
                                            </button>
                                            <button onclick={on_convert} class="px-4 py-2 rounded-lg text-sm font-bold bg-primary text-primary-foreground hover:opacity-90 transition-all">
                                                {"Convert"}
                                            </button>
                                            <button onclick={on_delete} class="px-4 py-2 rounded-lg text-sm font-bold bg-red-600 text-white hover:opacity-90 transition-all">
                                                {"Delete"}
                                            </button>
                                        </div>
                                    </div>
                                </div>
                            }
                        } else {
                            html! {}
                        }
                    }
                </>
            }
        ) }
    }
}

#[derive(Properties, PartialEq)]
struct LoginPageProps {
    on_authenticated: Callback<()>,
}

fn spawn_auth(
    kind: PendingAuth,
    email: String,
    password: String,
    pending: UseStateHandle<PendingAuth>,
    errors: UseStateHandle<FieldErrors>,
    on_authenticated: Callback<()>,
) {
    pending.set(kind);
    errors.set(FieldErrors::default());

    spawn_local(async move {
        let result = match kind {
            PendingAuth::SignUp => sign_up_email(&email, &password).await,
            PendingAuth::Google => sign_in_google().await,
            _ => login_email(&email, &password).await,
        };
        pending.set(PendingAuth::None);
        match result {
            Ok(()) => on_authenticated.emit(()),
            Err(err) => errors.set(err.field_errors()),
        }
    });
}

#[function_component(LoginPage)]
fn login_page(props: &LoginPageProps) -> Html {
    let email = use_state(|| "".to_string());
    let password = use_state(|| "".to_string());
    let errors = use_state(FieldErrors::default);
    let pending = use_state(|| PendingAuth::None);

    let busy = *pending != PendingAuth::None;
    let disabled = submit_disabled(&email, &password) || busy;

    let on_submit = {
        let email = email.clone();
        let password = password.clone();
        let errors = errors.clone();
        let pending = pending.clone();
        let on_authenticated = props.on_authenticated.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            spawn_auth(
                PendingAuth::Login,
                (*email).clone(),
                (*password).clone(),
                pending.clone(),
                errors.clone(),
                on_authenticated.clone(),
            );
        })
    };

    let on_sign_up = {
        let email = email.clone();
        let password = password.clone();
        let errors = errors.clone();
        let pending = pending.clone();
        let on_authenticated = props.on_authenticated.clone();
        Callback::from(move |_| {
            spawn_auth(
                PendingAuth::SignUp,
                (*email).clone(),
                (*password).clone(),
                pending.clone(),
                errors.clone(),
                on_authenticated.clone(),
            );
        })
    };

    let on_google = {
        let email = email.clone();
        let password = password.clone();
        let errors = errors.clone();
        let pending = pending.clone();
        let on_authenticated = props.on_authenticated.clone();
        Callback::from(move |_| {
            spawn_auth(
                PendingAuth::Google,
                (*email).clone(),
                (*password).clone(),
                pending.clone(),
                errors.clone(),
                on_authenticated.clone(),
            );
        })
    };

    html! {
        <div class="min-h-screen flex flex-col items-center justify-center gap-4 bg-background pb-16">
            <form class="w-full max-w-sm bg-card border border-border rounded-2xl shadow-lg p-8 space-y-4" onsubmit={on_submit}>
                <h1 class="text-2xl font-bold text-foreground text-center mb-2">{"Poliwallet 💼"}</h1>

                <div class="space-y-1">
                    <label class="text-sm font-medium text-foreground">{"Email"}</label>
                    <input
                        type="email"
                        class="w-full px-4 py-2 bg-input border border-input rounded-lg text-foreground focus:outline-none focus:ring-2 focus:ring-primary"
                        value={(*email).clone()}
                        oninput={{
                            let email = email.clone();
                            Callback::from(move |e: InputEvent| {
                                let input: web_sys::HtmlInputElement = e.target_unchecked_into();
                                email.set(input.value());
                            })
                        }}
                    />
                    <p class="text-xs text-red-500 h-4">{ errors.email.clone().unwrap_or_default() }</p>
                </div>

                <div class="space-y-1">
                    <label class="text-sm font-medium text-foreground">{"Password"}</label>
                    <input
                        type="password"
                        class="w-full px-4 py-2 bg-input border border-input rounded-lg text-foreground focus:outline-none focus:ring-2 focus:ring-primary"
                        value={(*password).clone()}
                        oninput={{
                            let password = password.clone();
                            Callback::from(move |e: InputEvent| {
                                let input: web_sys::HtmlInputElement = e.target_unchecked_into();
                                password.set(input.value());
                            })
                        }}
                    />
                    <p class="text-xs text-red-500 h-4">{ errors.password.clone().unwrap_or_default() }</p>
                </div>

                <div class="flex justify-between items-center pt-2">
                    <button
                        type="button"
                        onclick={on_sign_up}
                        disabled={disabled}
                        class="text-primary font-semibold text-sm disabled:opacity-50"
                    >
                        { if *pending == PendingAuth::SignUp { "Signing up..." } else { "Sign up" } }
                    </button>
                    <button
                        type="submit"
                        disabled={disabled}
                        class="bg-primary text-primary-foreground px-6 py-2 rounded-lg font-semibold hover:opacity-90 transition-opacity disabled:opacity-50"
                    >
                        { if *pending == PendingAuth::Login { "Logging in..." } else { "Login" } }
                    </button>
                </div>
            </form>

            <div class="w-full max-w-sm flex items-center gap-3 text-muted-foreground text-sm">
                <div class="flex-1 h-px bg-border"></div>
                {"or"}
                <div class="flex-1 h-px bg-border"></div>
            </div>

            <button
                onclick={on_google}
                disabled={busy}
                class="w-full max-w-sm bg-card border border-border rounded-lg py-2 font-semibold text-foreground hover:bg-muted/50 transition-colors disabled:opacity-50"
            >
                { if *pending == PendingAuth::Google { "Please wait..." } else { "Sign in with Google" } }
            </button>
        </div>
    }
}

#[function_component(App)]
fn app() -> Html {
    let active_page = use_state(|| Page::Wallet);
    let auth_status = use_state(|| AuthStatus::Checking);
    let settings = use_state(default_settings);

    let on_select = {
        let active_page = active_page.clone();
        Callback::from(move |page: Page| active_page.set(page))
    };

    {
        let auth_status = auth_status.clone();
        use_effect_with_deps(
            move |_| {
                spawn_local(async move {
                    let url = format!("{}/api/auth/refresh", API_BASE_URL);
                    let response = Request::post(&url)
                        .credentials(RequestCredentials::Include)
                        .send()
                        .await;

                    match response {
                        Ok(resp) if resp.ok() => {
                            if let Ok(json) = resp.json::<AuthSuccess>().await {
                                if let Some(token) = json.access_token {
                                    store_token(&token);
                                }
                            }
                            auth_status.set(AuthStatus::Authenticated);
                        }
                        _ => {
                            // An existing access token keeps the user logged
                            // in across page reloads.
                            let has_token = stored_token().map_or(false, |t| !t.is_empty());
                            if has_token {
                                auth_status.set(AuthStatus::Authenticated);
                            } else {
                                auth_status.set(AuthStatus::Unauthenticated);
                            }
                        }
                    }
                });
                || ()
            },
            (),
        );
    }

    // Pull the base currency from the user profile once authenticated.
    {
        let settings = settings.clone();
        use_effect_with_deps(
            move |authenticated| {
                if *authenticated {
                    spawn_local(async move {
                        if let Some(wallet) = fetch_wallet().await {
                            settings.set(wallet);
                        }
                    });
                }
                || ()
            },
            *auth_status == AuthStatus::Authenticated,
        );
    }

    let content = match *active_page {
        Page::Wallet => html! { <WalletPage /> },
        Page::Settings => html! { <SettingsPage /> },
    };

    if *auth_status == AuthStatus::Checking {
        return html! {
            <div class="min-h-screen flex items-center justify-center bg-background text-muted-foreground">
                {"Checking session..."}
            </div>
        };
    }

    if *auth_status == AuthStatus::Unauthenticated {
        return html! { <LoginPage on_authenticated={Callback::from(move |_| auth_status.set(AuthStatus::Authenticated))} /> };
    }

    html! {
        <ContextProvider<UseStateHandle<WalletSettings>> context={settings}>
            <Layout active_page={*active_page} on_select={on_select}>
                { content }
            </Layout>
        </ContextProvider<UseStateHandle<WalletSettings>>>
    }
}

fn icon_base(path: &'static str) -> Html {
    html! {
        <svg width="20" height="20" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2" stroke-linecap="round" stroke-linejoin="round" class="text-foreground">
            <path d={path}></path>
        </svg>
    }
}

fn icon_wallet() -> Html {
    icon_base("M3 7h18v10H3zM16 7V5H5v2")
}
fn icon_credit_card() -> Html {
    icon_base("M3 7h18v10H3zM3 11h18")
}
fn icon_settings() -> Html {
    icon_base("M12 1v3M12 20v3M4.2 4.2l2.1 2.1M17.7 17.7l2.1 2.1M1 12h3M20 12h3M4.2 19.8l2.1-2.1M17.7 6.3l2.1-2.1")
}
fn icon_log_out() -> Html {
    icon_base("M9 21H5a2 2 0 01-2-2V5a2 2 0 012-2h4M16 17l5-5-5-5M21 12H9")
}
fn icon_trash() -> Html {
    icon_base("M3 6h18M8 6V4h8v2M19 6l-1 14H6L5 6M10 11v6M14 11v6")
}
fn icon_arrow_up_right() -> Html {
    icon_base("M7 17L17 7M7 7h10v10")
}

fn main() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
    yew::Renderer::<App>::new().render();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn income(tag: &str, amount: f64, rate: Option<f64>) -> Transaction {
        Transaction {
            id: None,
            amount,
            currency: "PLN".to_string(),
            rate,
            tag: tag.to_string(),
            kind: TxKind::Income,
        }
    }

    #[test]
    fn breakdown_percentages_sum_to_100() {
        let incomes = vec![
            income("Salary", 3000.0, None),
            income("Freelance", 1200.0, None),
            income("Salary", 800.0, None),
            income("Gifts", 33.33, None),
        ];
        let shares = income_breakdown(&incomes);
        let sum: f64 = shares.iter().map(|(_, s)| s.percentage).sum();
        assert!((sum - 100.0).abs() < 1e-6, "percentages summed to {}", sum);
    }

    #[test]
    fn breakdown_sorted_by_descending_percentage() {
        let incomes = vec![
            income("Gifts", 50.0, None),
            income("Salary", 3000.0, None),
            income("Freelance", 700.0, None),
        ];
        let shares = income_breakdown(&incomes);
        let tags: Vec<&str> = shares.iter().map(|(tag, _)| tag.as_str()).collect();
        assert_eq!(tags, vec!["Salary", "Freelance", "Gifts"]);
        for pair in shares.windows(2) {
            assert!(pair[0].1.percentage >= pair[1].1.percentage);
        }
    }

    #[test]
    fn breakdown_groups_amounts_by_tag() {
        let incomes = vec![
            income("Salary", 100.0, None),
            income("Salary", 150.0, None),
            income("Other", 250.0, None),
        ];
        let shares = income_breakdown(&incomes);
        assert_eq!(shares.len(), 2);
        let salary = shares
            .iter()
            .find(|(tag, _)| tag == "Salary")
            .map(|(_, share)| share)
            .expect("salary share present");
        assert!((salary.amount - 250.0).abs() < 1e-9);
        assert!((salary.percentage - 50.0).abs() < 1e-9);
    }

    #[test]
    fn breakdown_of_empty_input_is_empty() {
        assert!(income_breakdown(&[]).is_empty());
    }

    #[test]
    fn breakdown_uses_converted_values() {
        let incomes = vec![
            income("Salary", 1000.0, Some(250.0)),
            income("Gifts", 250.0, None),
        ];
        let shares = income_breakdown(&incomes);
        assert!((shares[0].1.percentage - 50.0).abs() < 1e-9);
        assert!((shares[1].1.percentage - 50.0).abs() < 1e-9);
    }

    #[test]
    fn rate_in_base_prefers_converted_value() {
        let tx = income("Salary", 1000.0, Some(238.5));
        assert_eq!(rate_in_base(&tx), 238.5);
        let tx = income("Salary", 1000.0, None);
        assert_eq!(rate_in_base(&tx), 1000.0);
    }

    #[test]
    fn accepts_standard_email_addresses() {
        for email in [
            "user@example.com",
            "first.last@mail.co",
            "dev-ops@sub.domain.org",
            "name_1@host.info",
        ] {
            assert!(is_valid_email(email), "rejected {}", email);
        }
    }

    #[test]
    fn rejects_malformed_email_addresses() {
        for email in [
            "",
            "plainaddress",
            "no-at.example.com",
            "user@",
            "user@nodot",
            "user@example.",
            "user@example.toolong",
        ] {
            assert!(!is_valid_email(email), "accepted {}", email);
        }
    }

    #[test]
    fn short_password_disables_submission() {
        assert!(submit_disabled("user@example.com", "12345"));
        assert!(!submit_disabled("user@example.com", "123456"));
    }

    #[test]
    fn invalid_email_disables_submission_regardless_of_password() {
        assert!(submit_disabled("not-an-email", "long-enough-password"));
    }

    #[test]
    fn error_parse_routes_password_codes_to_password_field() {
        let errors = human_error_parse("auth/wrong-password");
        assert_eq!(errors.password.as_deref(), Some("Wrong password"));
        assert!(errors.email.is_none());
    }

    #[test]
    fn error_parse_routes_other_codes_to_email_field() {
        let errors = human_error_parse("auth/invalid-email");
        assert_eq!(errors.email.as_deref(), Some("Invalid email"));
        assert!(errors.password.is_none());

        let errors = human_error_parse("auth/user-not-found");
        assert_eq!(errors.email.as_deref(), Some("User not found"));
    }

    #[test]
    fn error_parse_handles_codes_without_a_slash() {
        let errors = human_error_parse("too-many-requests");
        assert_eq!(errors.email.as_deref(), Some("Too many requests"));
    }

    #[test]
    fn currency_formatting_uses_commas_and_two_decimals() {
        assert_eq!(format_currency(1234567.891, "USD"), "1,234,567.89 USD");
        assert_eq!(format_currency(0.5, "EUR"), "0.50 EUR");
        assert_eq!(format_currency(-42.0, "GBP"), "-42.00 GBP");
    }

    #[test]
    fn percentage_formatting_keeps_one_decimal_for_tiny_shares() {
        assert_eq!(format_percentage(42.4), "42%");
        assert_eq!(format_percentage(42.6), "43%");
        assert_eq!(format_percentage(0.3), "0.3%");
    }

    #[test]
    fn tag_colors_are_stable() {
        assert_eq!(tag_color("Salary"), tag_color("Salary"));
        assert!(TAG_PALETTE.contains(&tag_color("Freelance")));
    }
}

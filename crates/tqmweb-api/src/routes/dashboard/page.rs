//! Dashboard page rendering - Full page endpoint

use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse, Response};
use tqmweb_config::Config;
use tqmweb_core::{DashboardReport, DashboardStats, OrderView};
use tqmweb_utils::{escape_html, first_words, json_for_script};

use crate::error::ApiError;
use crate::routes::WindowQuery;
use crate::AppState;

pub async fn page_dashboard(State(state): State<AppState>, Query(query): Query<WindowQuery>) -> Response {
    let config = state.config();
    let report = match state.dashboard() {
        Ok(dashboard) => dashboard.build_report(query.window()).await.map_err(ApiError::from),
        Err(e) => Err(e),
    };
    match report {
        Ok(report) => Html(render_dashboard(config, &report)).into_response(),
        Err(error) => {
            let status = error.status();
            log::error!("Dashboard unavailable ({}): {}", status, error);
            (status, Html(crate::error_page(&config.dashboard.title, &error.to_string()))).into_response()
        }
    }
}

/// Full dashboard document
pub fn render_dashboard(config: &Config, report: &DashboardReport) -> String {
    let content = format!(
        "{header}{cards}{table}{modals}{script}",
        header = render_header(config, report),
        cards = render_stat_cards(&report.stats),
        table = render_order_table(report),
        modals = render_modals(report),
        script = render_script(report),
    );
    crate::base_html(&config.dashboard.title, &content)
}

fn render_header(config: &Config, report: &DashboardReport) -> String {
    format!(
        r#"<header class="mb-8">
    <div class="flex flex-col sm:flex-row sm:items-center sm:justify-between gap-3">
        <h1 class="text-3xl font-bold text-gray-800">{title}</h1>
        <button id="refresh-btn" onclick="refreshOrders()" class="text-sm px-3 py-2 rounded-md border border-indigo-200 text-indigo-600 hover:bg-indigo-50">Refresh Orders</button>
    </div>
    <form id="filter-form" method="get" action="/" class="flex flex-col sm:flex-row items-end gap-3 mt-4 bg-white p-4 rounded-lg shadow-sm">
        <div class="flex flex-col flex-grow w-full sm:w-auto">
            <label for="from" class="text-sm font-medium text-gray-600">Order Date From:</label>
            <input type="date" id="from" name="from" value="{from}" class="mt-1 p-2 border border-gray-300 rounded-md">
        </div>
        <div class="flex flex-col flex-grow w-full sm:w-auto">
            <label for="to" class="text-sm font-medium text-gray-600">Order Date To (Optional):</label>
            <input type="date" id="to" name="to" value="{to}" class="mt-1 p-2 border border-gray-300 rounded-md">
        </div>
        <button type="submit" class="w-full sm:w-auto px-4 py-2 bg-indigo-600 text-white font-semibold rounded-md shadow-md hover:bg-indigo-700">Apply Filter</button>
    </form>
    <p class="text-xs text-gray-500 mt-2">{description}{loaded_at}</p>
</header>"#,
        title = escape_html(&config.dashboard.title),
        from = escape_html(&report.from),
        to = escape_html(&report.to),
        description = escape_html(&report.description),
        loaded_at = report
            .loaded_at
            .as_deref()
            .map(|t| format!(" · orders loaded {}", escape_html(t)))
            .unwrap_or_default(),
    )
}

fn render_stat_cards(stats: &DashboardStats) -> String {
    let payables_class = if stats.net_payables_raw.is_sign_positive() && !stats.net_payables_raw.is_zero() {
        "text-red-600"
    } else {
        "text-green-600"
    };

    let vendor_rows: String = stats
        .vendor_lines
        .iter()
        .map(|line| {
            format!(
                r#"<div class="row text-sm text-gray-500"><span>- {vendor} Liability</span><span>{liability}</span></div>
                <div class="row text-xs text-gray-400"><span>&nbsp;&nbsp;Paid / Net Payable</span><span>{paid} / {net}</span></div>"#,
                vendor = escape_html(&line.vendor),
                liability = escape_html(&line.liability_fmt),
                paid = escape_html(&line.paid_fmt),
                net = escape_html(&line.net_payable_fmt),
            )
        })
        .collect();

    format!(
        r#"<div class="grid grid-cols-1 md:grid-cols-4 gap-6 mb-8">
    <div class="card p-5 bg-white rounded-xl border border-gray-200">
        <h3 class="text-lg font-semibold text-gray-700 mb-2">Net Vendor Payables</h3>
        <p class="text-2xl font-bold {payables_class}">{net_payables}</p>
        <p class="text-sm text-gray-500 mt-2">Total Liability - Payments Made</p>
        <button onclick="openPaymentModal()" class="mt-3 text-indigo-600 hover:text-indigo-800 text-sm font-medium">Record New Payment</button>
    </div>
    <div class="card p-5 bg-white rounded-xl border border-gray-200">
        <h3 class="text-lg font-semibold text-gray-700 mb-2">Total Vendor Cost Liability</h3>
        <div class="row text-lg font-bold"><span>Total Cost</span><span class="text-gray-900">{cost_total}</span></div>
        {vendor_rows}
        <p class="text-sm text-gray-500 mt-2">Total Cost of Goods &amp; Packaging</p>
    </div>
    <div class="card p-5 bg-white rounded-xl border border-gray-200">
        <h3 class="text-lg font-semibold text-gray-700 mb-2">Total Payments Recorded</h3>
        <p class="text-2xl font-bold text-green-600">{total_paid}</p>
        <p class="text-sm text-gray-500 mt-2">Historic Payments to Vendors</p>
        <button onclick="openHistoryModal()" class="mt-3 text-indigo-600 hover:text-indigo-800 text-sm font-medium">View Payment History</button>
    </div>
    <div class="card p-5 bg-white rounded-xl border border-gray-200">
        <h3 class="text-lg font-semibold text-gray-700 mb-2">Net Profit Collected</h3>
        <p class="text-2xl font-bold text-blue-600">{profit}</p>
        <p class="text-sm text-gray-500 mt-2">Profit from {paid_orders} Paid/Settled Orders (After Marketplace Fees)</p>
        {needs_cost}
    </div>
</div>"#,
        payables_class = payables_class,
        net_payables = escape_html(&stats.net_payables),
        cost_total = escape_html(&stats.vendor_cost_total),
        vendor_rows = vendor_rows,
        total_paid = escape_html(&stats.total_paid),
        profit = escape_html(&stats.net_profit_collected),
        paid_orders = stats.paid_order_count,
        needs_cost = if stats.needs_cost_count > 0 {
            format!(
                r#"<p class="text-xs text-yellow-700 mt-2">{} order(s) have items without a cost</p>"#,
                stats.needs_cost_count
            )
        } else {
            String::new()
        },
    )
}

/// Badge colors for the settlement status
fn status_badge_class(paid_status: &str) -> &'static str {
    match paid_status {
        tqmweb_core::models::STATUS_PAID => "bg-green-100 text-green-800",
        tqmweb_core::models::STATUS_NOT_PAID => "bg-yellow-100 text-yellow-800",
        _ => "bg-red-100 text-red-800",
    }
}

fn render_order_row(order: &OrderView) -> String {
    let profit_class = if order.net_profit_num.is_sign_negative() && !order.net_profit_num.is_zero() {
        "text-red-700"
    } else {
        "text-green-700"
    };
    let returned = if order.is_returned {
        r#"<br><span class="text-xs font-semibold text-red-600">RETURNED / FAILED</span>"#
    } else {
        ""
    };

    format!(
        r#"<tr class="hover:bg-gray-50">
    <td class="px-3 py-4 whitespace-nowrap text-sm font-medium text-gray-900">{order_id}<br><span class="text-xs text-gray-500">{order_date}</span>{returned}</td>
    <td class="px-3 py-4 whitespace-nowrap text-sm text-gray-500"><strong>{customer}</strong><br><span class="text-xs">{address}</span></td>
    <td class="px-3 py-4 whitespace-nowrap text-right">
        <span class="px-2 inline-flex text-xs leading-5 font-semibold rounded-full {badge}">{paid_status}</span><br>
        <span class="text-xs text-gray-500">{statement}</span>
    </td>
    <td class="px-3 py-4 whitespace-nowrap text-sm text-right text-gray-900 font-medium">{invoice}</td>
    <td class="px-3 py-4 whitespace-nowrap text-sm text-right text-red-600 font-medium">{product_cost}<br><span class="text-xs text-gray-500">+ {packaging} (Pkg)</span></td>
    <td class="px-3 py-4 whitespace-nowrap text-sm text-right font-bold {profit_class}">{net_profit}</td>
    <td class="px-3 py-4 whitespace-nowrap text-center text-sm">
        <button data-order-id="{order_id}" onclick="openDetailModal(this.dataset.orderId)" class="text-indigo-600 hover:text-indigo-900 text-sm font-medium">{item_count} Item(s)</button>
    </td>
</tr>"#,
        order_id = escape_html(&order.order_id),
        order_date = escape_html(&order.order_date),
        returned = returned,
        customer = escape_html(&order.customer.name),
        address = escape_html(&first_words(&order.customer.address, 6)),
        badge = status_badge_class(&order.paid_status),
        paid_status = escape_html(&order.paid_status),
        statement = escape_html(&first_words(&order.statement, 4)),
        invoice = escape_html(&order.invoice_amount),
        product_cost = escape_html(&order.product_cost_total),
        packaging = escape_html(&order.packaging_total),
        profit_class = profit_class,
        net_profit = escape_html(&order.net_profit),
        item_count = order.items_list.len(),
    )
}

fn render_order_table(report: &DashboardReport) -> String {
    let rows: String = report.orders.iter().map(render_order_row).collect();
    let empty = if report.orders.is_empty() {
        r#"<p class="text-center text-gray-500 py-10">No orders found matching your criteria.</p>"#
    } else {
        ""
    };

    format!(
        r#"<div class="bg-white rounded-xl shadow-lg p-6">
    <h2 class="text-2xl font-semibold text-gray-800 mb-4">{count} Orders Found</h2>
    <div class="overflow-x-auto">
        <table class="min-w-full divide-y divide-gray-200">
            <thead>
                <tr class="bg-gray-50 text-xs font-medium text-gray-500 uppercase tracking-wider">
                    <th class="px-3 py-3 text-left">Order ID / Date</th>
                    <th class="px-3 py-3 text-left">Customer / Address</th>
                    <th class="px-3 py-3 text-right">Invoice Status</th>
                    <th class="px-3 py-3 text-right">Net Received</th>
                    <th class="px-3 py-3 text-right">Vendor Cost</th>
                    <th class="px-3 py-3 text-right">Net Profit</th>
                    <th class="px-3 py-3 text-center">Items</th>
                </tr>
            </thead>
            <tbody class="bg-white divide-y divide-gray-200">{rows}</tbody>
        </table>
    </div>
    {empty}
</div>"#,
        count = report.orders.len(),
        rows = rows,
        empty = empty,
    )
}

fn render_modals(report: &DashboardReport) -> String {
    let vendor_options: String = report
        .vendors
        .iter()
        .map(|v| format!(r#"<option value="{0}">{0}</option>"#, escape_html(v)))
        .collect();

    format!(
        r#"<div id="detail-modal-overlay" class="modal-overlay fixed inset-0 hidden items-center justify-center">
    <div class="bg-white rounded-xl shadow-2xl p-6 w-11/12 md:w-4/5 lg:w-3/5 modal-content overflow-y-auto">
        <div class="flex justify-between items-start mb-4 border-b pb-2">
            <h3 class="text-xl font-bold text-gray-800">Order Details: <span id="modal-order-id" class="text-indigo-600"></span></h3>
            <button onclick="closeModal('detail-modal-overlay')" class="text-gray-400 hover:text-gray-600 text-2xl leading-none">&times;</button>
        </div>
        <div id="modal-content-area" class="space-y-6"></div>
    </div>
</div>
<div id="payment-modal-overlay" class="modal-overlay fixed inset-0 hidden items-center justify-center">
    <div class="bg-white rounded-xl shadow-2xl p-6 w-11/12 md:w-1/3 modal-content overflow-y-auto">
        <div class="flex justify-between items-start mb-4 border-b pb-2">
            <h3 class="text-xl font-bold text-gray-800">Record Vendor Payment</h3>
            <button onclick="closeModal('payment-modal-overlay')" class="text-gray-400 hover:text-gray-600 text-2xl leading-none">&times;</button>
        </div>
        <form id="record-payment-form" class="space-y-4">
            <div>
                <label for="payment-vendor" class="block text-sm font-medium text-gray-700">Vendor</label>
                <select id="payment-vendor" name="vendor" required class="mt-1 block w-full py-2 border-gray-300 rounded-md sm:text-sm">{vendor_options}</select>
            </div>
            <div>
                <label for="payment-amount" class="block text-sm font-medium text-gray-700">Amount ({currency})</label>
                <input type="number" id="payment-amount" name="amount" step="0.01" min="0.01" required class="mt-1 block w-full rounded-md border-gray-300 shadow-sm sm:text-sm p-2">
            </div>
            <div>
                <label for="payment-date" class="block text-sm font-medium text-gray-700">Payment Date</label>
                <input type="date" id="payment-date" name="date" required class="mt-1 block w-full rounded-md border-gray-300 shadow-sm sm:text-sm p-2">
            </div>
            <button type="submit" id="payment-submit-btn" class="w-full px-4 py-2 rounded-md shadow-sm text-base font-medium text-white bg-indigo-600 hover:bg-indigo-700">Record Payment</button>
            <div id="payment-message" class="text-center mt-3 hidden"></div>
        </form>
    </div>
</div>
<div id="history-modal-overlay" class="modal-overlay fixed inset-0 hidden items-center justify-center">
    <div class="bg-white rounded-xl shadow-2xl p-6 w-11/12 md:w-2/3 lg:w-2/5 modal-content overflow-y-auto">
        <div class="flex justify-between items-start mb-4 border-b pb-2">
            <h3 class="text-xl font-bold text-gray-800">Vendor Payment History</h3>
            <button onclick="closeModal('history-modal-overlay')" class="text-gray-400 hover:text-gray-600 text-2xl leading-none">&times;</button>
        </div>
        <p class="text-gray-500 text-center py-4" id="history-loading">Loading payment history...</p>
        <div id="history-content-area" class="space-y-3"></div>
    </div>
</div>"#,
        vendor_options = vendor_options,
        currency = escape_html(&report.currency),
    )
}

fn render_script(report: &DashboardReport) -> String {
    format!(
        "<script>\nconst ORDERS_DATA = {orders};\nconst VENDORS = {vendors};\nconst CURRENCY = {currency};\n</script>\n<script>{body}</script>",
        orders = json_for_script(&report.orders),
        vendors = json_for_script(&report.vendors),
        currency = json_for_script(&report.currency),
        body = DASHBOARD_SCRIPT,
    )
}

/// Client-side modals; reads ORDERS_DATA, VENDORS and CURRENCY
const DASHBOARD_SCRIPT: &str = r##"
function esc(value) {
    return String(value ?? '').replace(/[&<>"']/g, c => ({'&': '&amp;', '<': '&lt;', '>': '&gt;', '"': '&quot;', "'": '&#39;'}[c]));
}

function _d(x) {
    return parseFloat(String(x).replace(/[^0-9.-]/g, '')) || 0;
}

function getOrderData(orderId) {
    return ORDERS_DATA.find(o => String(o.order_id) === String(orderId));
}

function openModal(id) {
    const overlay = document.getElementById(id);
    overlay.classList.remove('hidden');
    overlay.classList.add('flex');
}

function closeModal(id) {
    const overlay = document.getElementById(id);
    overlay.classList.add('hidden');
    overlay.classList.remove('flex');
}

function vendorOptions(selected) {
    return VENDORS.map(v => `<option value="${esc(v)}" ${v === selected ? 'selected' : ''}>${esc(v)}</option>`).join('');
}

function renderItem(item) {
    return `
        <div class="data-grid border p-3 rounded-lg bg-gray-50">
            <div>
                <p class="font-bold text-sm">${esc(item.item_title)}</p>
                <p class="text-xs text-gray-500">SKU: ${esc(item.key)}</p>
                <p class="text-xs text-gray-500">Tracking: ${esc(item.tracking_number || 'N/A')}</p>
                ${item.is_returned ? '<span class="text-xs font-semibold text-red-600">ITEM RETURNED / FAILED</span>' : ''}
            </div>
            <div>
                <p class="text-xs font-medium text-gray-700">Qty / Status</p>
                <p class="text-sm">${esc(item.quantity)} / <span class="font-semibold text-indigo-600">${esc(item.status)}</span></p>
            </div>
            <div>
                <p class="text-xs font-medium text-gray-700">Unit Costs &amp; Vendor</p>
                <div class="flex justify-between text-xs"><span>Product Cost:</span><span class="${item.is_returned ? 'line-through text-gray-400' : 'text-red-600'}">${esc(CURRENCY)} ${esc(item.product_cost)}</span></div>
                <div class="flex justify-between text-xs"><span>Packaging Cost:</span><span class="text-red-600">${esc(CURRENCY)} ${esc(item.packaging)}</span></div>
                <div class="flex justify-between text-xs mt-1"><span>Vendor:</span><span class="font-semibold text-gray-700">${esc(item.vendor)}</span></div>
                ${item.needs_cost ? '<div class="mt-2 p-2 bg-yellow-100 text-yellow-800 rounded-md text-xs">Cost is missing. Please update.</div>' : ''}
                <form onsubmit="saveItemCost(event)" class="mt-2 space-y-1 text-xs">
                    <input type="hidden" name="key" value="${esc(item.key)}">
                    <input type="number" name="product_cost" placeholder="Product Cost" step="0.01" value="${esc(item.product_cost)}" class="w-full p-1 border rounded-md">
                    <input type="number" name="packaging" placeholder="Packaging Cost" step="0.01" value="${esc(item.packaging)}" class="w-full p-1 border rounded-md">
                    <select name="vendor" class="w-full p-1 border rounded-md">${vendorOptions(item.vendor)}</select>
                    <button type="submit" class="w-full bg-indigo-500 text-white py-1 rounded-md hover:bg-indigo-600">Save Cost</button>
                </form>
            </div>
        </div>`;
}

function renderDetailContent(order) {
    const breakdown = order.invoice_breakdown.length
        ? order.invoice_breakdown.map(line => `
            <div class="row text-xs"><span>${esc(line.label)}:</span><span class="${_d(line.amount_fmt) < 0 ? 'text-red-600' : 'text-green-600'}">${esc(line.amount_fmt)}</span></div>`).join('')
        : '<p class="text-xs text-gray-500">No settlement rows yet.</p>';

    document.getElementById('modal-content-area').innerHTML = `
        <div class="grid grid-cols-1 sm:grid-cols-2 gap-4 text-sm">
            <div>
                <p class="font-semibold text-gray-700">Customer Info:</p>
                <p>${esc(order.customer.name)}</p>
                <p class="text-xs text-gray-500">${esc(order.customer.address)}</p>
                <p class="text-xs text-gray-500">${esc(order.customer.phone)}</p>
            </div>
            <div>
                <p class="font-semibold text-gray-700">Financial Summary:</p>
                <div class="row text-xs"><span>Order Price:</span><span>${esc(order.price)}</span></div>
                <div class="row text-xs"><span>Net Received:</span><span class="font-bold">${esc(order.invoice_amount)}</span></div>
                <div class="row text-xs"><span>Total Product Cost:</span><span class="text-red-600">${esc(order.product_cost_total)}</span></div>
                <div class="row text-xs"><span>Total Packaging Cost:</span><span class="text-red-600">${esc(order.packaging_total)}</span></div>
                <div class="row text-xs font-bold mt-1"><span>Net Profit:</span><span class="${_d(order.net_profit_num) < 0 ? 'text-red-700' : 'text-green-700'}">${esc(order.net_profit)}</span></div>
                <p class="text-xs text-gray-500 mt-2 italic">Statement: ${esc(order.statement || 'N/A')}</p>
            </div>
        </div>
        <h4 class="text-lg font-semibold text-gray-700 mt-4 mb-2">Invoice Breakdown (Net Received = Sum of below)</h4>
        <div class="data-grid text-xs">${breakdown}</div>
        <h4 class="text-lg font-semibold text-gray-700 mt-6 mb-2">Order Items (Status &amp; Costs)</h4>
        <div class="space-y-4">${order.items_list.map(renderItem).join('')}</div>`;
}

function openDetailModal(orderId) {
    const order = getOrderData(orderId);
    if (!order) {
        console.error('Order not found:', orderId);
        return;
    }
    document.getElementById('modal-order-id').textContent = orderId;
    renderDetailContent(order);
    openModal('detail-modal-overlay');
}

async function postJson(url, body) {
    const response = await fetch(url, {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: body === undefined ? undefined : JSON.stringify(body)
    });
    return response.json();
}

async function saveItemCost(event) {
    event.preventDefault();
    const form = event.target;
    const button = form.querySelector('button[type="submit"]');
    try {
        const result = await postJson('/api/save_cost', {
            key: form.elements['key'].value,
            product_cost: form.elements['product_cost'].value,
            packaging: form.elements['packaging'].value,
            vendor: form.elements['vendor'].value
        });
        if (result.ok) {
            button.textContent = 'Saved!';
            button.classList.remove('bg-indigo-500', 'hover:bg-indigo-600');
            button.classList.add('bg-green-500');
            button.disabled = true;
            setTimeout(() => window.location.reload(), 800);
        } else {
            alert('Failed to save cost: ' + result.error);
        }
    } catch (error) {
        console.error('Save cost error:', error);
        alert('An unexpected error occurred while saving the cost.');
    }
}

function openPaymentModal() {
    document.getElementById('payment-message').classList.add('hidden');
    document.getElementById('payment-date').value = new Date().toISOString().split('T')[0];
    openModal('payment-modal-overlay');
}

function showPaymentMessage(text, ok) {
    const message = document.getElementById('payment-message');
    message.textContent = text;
    message.classList.remove('hidden', ok ? 'text-red-600' : 'text-green-600');
    message.classList.add(ok ? 'text-green-600' : 'text-red-600');
}

document.getElementById('record-payment-form').addEventListener('submit', async function(event) {
    event.preventDefault();
    const form = event.target;
    const submit = document.getElementById('payment-submit-btn');
    submit.disabled = true;
    submit.textContent = 'Recording...';
    try {
        const result = await postJson('/api/record_payment', {
            vendor: form.elements['vendor'].value,
            amount: parseFloat(form.elements['amount'].value),
            date: form.elements['date'].value
        });
        if (result.ok) {
            showPaymentMessage('Payment recorded successfully!', true);
            form.reset();
            setTimeout(() => {
                closeModal('payment-modal-overlay');
                window.location.reload();
            }, 1500);
        } else {
            showPaymentMessage('Error: ' + (result.error || 'Failed to record payment.'), false);
        }
    } catch (error) {
        console.error('Payment record error:', error);
        showPaymentMessage('An unexpected error occurred.', false);
    } finally {
        submit.disabled = false;
        submit.textContent = 'Record Payment';
    }
});

function openHistoryModal() {
    openModal('history-modal-overlay');
    loadPaymentHistory();
}

async function loadPaymentHistory() {
    const loading = document.getElementById('history-loading');
    const content = document.getElementById('history-content-area');
    loading.textContent = 'Loading payment history...';
    loading.classList.remove('hidden', 'text-red-600');
    content.innerHTML = '';
    try {
        const result = await (await fetch('/api/get_payments')).json();
        if (!result.ok) {
            loading.textContent = 'Error loading history: ' + (result.error || 'Unknown error.');
            loading.classList.add('text-red-600');
            return;
        }
        loading.classList.add('hidden');
        if (result.history.length === 0) {
            content.innerHTML = '<p class="text-gray-500 text-center py-4">No payment history found.</p>';
            return;
        }
        const rows = result.history.map(p => `
            <tr class="hover:bg-gray-50">
                <td class="px-3 py-2 whitespace-nowrap text-sm text-gray-500">${esc(p.date)}</td>
                <td class="px-3 py-2 whitespace-nowrap text-sm font-medium text-gray-900">${esc(p.vendor)}</td>
                <td class="px-3 py-2 whitespace-nowrap text-sm text-right font-semibold text-green-700">${esc(p.amount_fmt)}</td>
            </tr>`).join('');
        content.innerHTML = `
            <table class="min-w-full divide-y divide-gray-200">
                <thead><tr class="bg-gray-50 text-xs font-medium text-gray-500 uppercase tracking-wider">
                    <th class="px-3 py-3 text-left">Date</th><th class="px-3 py-3 text-left">Vendor</th><th class="px-3 py-3 text-right">Amount</th>
                </tr></thead>
                <tbody class="bg-white divide-y divide-gray-200">${rows}</tbody>
            </table>`;
    } catch (error) {
        console.error('History load error:', error);
        loading.textContent = 'An unexpected error occurred while fetching history.';
        loading.classList.remove('hidden');
        loading.classList.add('text-red-600');
    }
}

async function refreshOrders() {
    const button = document.getElementById('refresh-btn');
    button.disabled = true;
    button.textContent = 'Refreshing...';
    try {
        const result = await postJson('/api/refresh');
        if (!result.ok) {
            alert('Refresh failed: ' + result.error);
        }
    } finally {
        window.location.reload();
    }
}

window.addEventListener('load', function() {
    const to = document.getElementById('to');
    if (!to.value) {
        to.value = new Date().toISOString().split('T')[0];
    }
});
"##;
